//! # testkit-doubles
//!
//! > Stub-and-count test doubles and dirty-tracking models for Rust tests
//!
//! **testkit-doubles** intercepts method calls by name. A [`Mock`] puts a stub
//! table and call counters in front of any object without hiding what the
//! object already does, and a [`ModelClass`] turns declared fields into
//! accessors whose writes are tracked and can be rolled back.
//!
//! ## Quick Start
//!
//! ```rust
//! use testkit_doubles::prelude::*;
//!
//! let mock = Mock::new();
//! mock.expects("greet", "hi").watch("greet");
//!
//! assert_eq!(mock.call("greet", &[]).unwrap(), json!("hi"));
//! assert_eq!(mock.call("greet", &[]).unwrap(), json!("hi"));
//! assert_eq!(mock.called_times("greet"), Some(2));
//!
//! let person = ModelClass::builder("Person").fields(["name", "age"]).build();
//! let mut p = person.instantiate(json!({"name": "Ann", "age": 30})).unwrap();
//!
//! p.set("name", "Bea").unwrap();
//! assert!(p.changed());
//! p.restore();
//! assert_eq!(p.get("name").unwrap(), "Ann");
//! ```
//!
//! ## Features
//!
//! - 🎭 **Mocks** - Stub methods on blank or existing objects
//! - 🔢 **Watches** - Count calls to stubbed and native methods
//! - 📝 **Dirty tracking** - Per-field and aggregate change queries
//! - ⏪ **Restore** - Roll a model back to its construction-time snapshot
//! - 🔌 **`#[responds]`** - Make an ordinary `impl` block dispatchable by name

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatch;
pub mod error;
pub mod mock;
pub mod model;

/// Prelude for convenient imports
///
/// ```rust
/// use testkit_doubles::prelude::*;
/// ```
pub mod prelude {
    pub use crate::dispatch::{Respond, Value};
    pub use crate::error::{Error, Result};
    pub use crate::mock::Mock;
    pub use crate::model::{FieldKind, Model, ModelClass};
    pub use serde_json::json;

    #[cfg(feature = "macros")]
    pub use testkit_doubles_macros::responds;
}

// Re-exports
pub use dispatch::{Respond, Value};
pub use error::{Error, Result};
pub use mock::Mock;
pub use model::{FieldKind, FieldSpec, Model, ModelClass, ModelClassBuilder};
pub use serde_json::json;

// Re-export the dispatch macro when macros feature is enabled
#[cfg(feature = "macros")]
pub use testkit_doubles_macros::responds;
