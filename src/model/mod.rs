//! Dirty-tracking models.
//!
//! A [`ModelClass`] declares tracked fields once; every [`Model`] built from
//! it records which of those fields were written and can roll them back.
//!
//! - [`ModelClass`] / [`ModelClassBuilder`] - Field declarations
//! - [`Model`] - An instance with values, a snapshot and dirty flags
//! - [`FieldKind`] - `Any` or `Bool` (boolean fields get a `name?` query)
//!
//! Every instance is also a [`Respond`](crate::Respond) target, reachable by
//! the generated accessor names (`name`, `name=`, `name_changed?`, `name?`)
//! as well as `changed?` and `restore!`.
//!
//! # Example
//!
//! ```rust
//! use testkit_doubles::{ModelClass, Respond, json};
//!
//! let class = ModelClass::builder("Person").fields(["name", "age"]).build();
//! let mut p = class.instantiate(json!({"name": "Ann", "age": 30})).unwrap();
//!
//! p.dispatch("name=", &[json!("Bea")]).unwrap();
//! assert_eq!(p.dispatch("name_changed?", &[]).unwrap(), json!(true));
//! assert_eq!(p.dispatch("age_changed?", &[]).unwrap(), json!(false));
//!
//! p.dispatch("restore!", &[]).unwrap();
//! assert_eq!(p.dispatch("name", &[]).unwrap(), json!("Ann"));
//! ```

mod class;
mod instance;

pub use class::{FieldKind, FieldSpec, ModelClass, ModelClassBuilder};
pub use instance::Model;
