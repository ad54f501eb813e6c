//! Stub-and-count test doubles.
//!
//! - [`Mock`] - Wraps a blank or existing object with stubs and call counters
//!
//! # Blank mocks
//!
//! ```rust
//! use testkit_doubles::{Mock, json};
//!
//! let mock = Mock::new();
//! mock.expects("fetch", json!({"id": 1}));
//!
//! assert_eq!(mock.call("fetch", &[]).unwrap()["id"], 1);
//! assert!(mock.call("store", &[]).is_err());
//! ```
//!
//! # Wrapping existing objects
//!
//! Any [`Respond`](crate::Respond) type can be wrapped. Its own methods stay
//! callable, and watching one of them counts calls before delegating.
//!
//! ```rust
//! use testkit_doubles::{Mock, ModelClass, json};
//!
//! let class = ModelClass::builder("Person").field("name").build();
//! let person = class.instantiate(json!({"name": "Ann"})).unwrap();
//!
//! let mock = Mock::wrap(person);
//! mock.watch("name");
//! mock.call("name", &[]).unwrap();
//!
//! assert_eq!(mock.called_times("name"), Some(1));
//! ```

mod double;

pub use double::Mock;
