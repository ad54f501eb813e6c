//! Example: stubbing and counting calls on an existing object
//!
//! Run with: cargo run --example wrapped_greeter

use testkit_doubles::prelude::*;

struct Greeter {
    name: String,
}

#[responds(name = "Greeter")]
impl Greeter {
    fn greet(&self) -> String {
        format!("hello from {}", self.name)
    }

    #[responds(rename = "//")]
    fn slashes(&self) -> &'static str {
        "//"
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Blank mock ===\n");

    let blank = Mock::new();
    blank.expects("imitated_method", true).watch("imitated_method");
    for _ in 0..2 {
        println!("imitated_method -> {}", blank.call("imitated_method", &[])?);
    }
    println!("called_times = {:?}", blank.called_times("imitated_method"));

    println!("\n=== Wrapped object ===\n");

    let mock = Mock::wrap(Greeter {
        name: "native".to_string(),
    });
    mock.watch("greet");
    println!("greet -> {}", mock.call("greet", &[])?);
    println!("//    -> {}", mock.call("//", &[])?);

    mock.expects("greet", "stubbed");
    println!("greet -> {}", mock.call("greet", &[])?);
    println!("called_times(greet) = {:?}", mock.called_times("greet"));

    if let Err(err) = mock.call("wave", &[]) {
        println!("\nwave -> {err}");
    }

    Ok(())
}
