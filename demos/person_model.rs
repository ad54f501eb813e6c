//! Example: tracking and rolling back field changes
//!
//! Run with: cargo run --example person_model

use testkit_doubles::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Dirty tracking ===\n");

    let person = ModelClass::builder("Person")
        .fields(["name", "age"])
        .bool_field("admin")
        .build();

    let mut ann = person.instantiate(json!({"name": "Ann", "age": 30}))?;
    println!("Fresh:    name={} changed={}", ann.get("name")?, ann.changed());

    ann.set("name", "Bea")?;
    ann.set("admin", true)?;
    println!(
        "Edited:   name={} admin?={} changed={:?}",
        ann.get("name")?,
        ann.flag("admin")?,
        ann.changed_fields()
    );
    println!("age_changed? = {}", ann.dispatch("age_changed?", &[])?);

    ann.restore();
    println!("Restored: name={} changed={}", ann.get("name")?, ann.changed());

    match ann.dispatch("email_changed?", &[]) {
        Ok(_) => unreachable!("email was never declared"),
        Err(err) => println!("\nUndeclared query: {err}"),
    }

    match person.instantiate(json!(["Ann", 30])) {
        Ok(_) => unreachable!("arrays are not mappings"),
        Err(err) => println!("Bad input: {err}"),
    }

    Ok(())
}
