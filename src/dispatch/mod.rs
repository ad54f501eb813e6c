//! Name-based method dispatch.
//!
//! Everything a double can intercept goes through one entry point,
//! [`Respond::respond`], which looks a method up by name in some dispatch
//! table and runs it against a slice of dynamic [`Value`] arguments.
//!
//! - [`Respond`] - The capability interface implemented by dispatch targets
//! - [`names`] - Naming conventions for generated accessors
//! - [`coerce`] - Argument and return value conversion used by `#[responds]`
//!
//! # Example
//!
//! ```rust
//! use testkit_doubles::{Respond, Result, Value, json};
//!
//! struct Counter(i64);
//!
//! impl Respond for Counter {
//!     fn respond(&mut self, method: &str, _args: &[Value]) -> Option<Result<Value>> {
//!         match method {
//!             "incr" => {
//!                 self.0 += 1;
//!                 Some(Ok(json!(self.0)))
//!             }
//!             _ => None,
//!         }
//!     }
//!
//!     fn responds_to(&self, method: &str) -> bool {
//!         method == "incr"
//!     }
//! }
//!
//! let mut counter = Counter(0);
//! assert_eq!(counter.dispatch("incr", &[]).unwrap(), json!(1));
//! assert!(counter.dispatch("decr", &[]).unwrap_err().is_unsupported());
//! ```

pub mod coerce;
pub mod names;

use crate::error::{Error, Result};

/// Dynamic value passed to and returned from dispatched methods.
pub use serde_json::Value;

/// An object whose methods can be invoked by name.
///
/// Returning `None` from [`respond`](Respond::respond) means the object has no
/// method called `method`; callers turn that into
/// [`Error::UnsupportedMethod`]. `Some(Err(_))` is a failure raised by the
/// method itself and is passed through untouched.
pub trait Respond {
    /// Invoke `method` with `args`, or return `None` if there is no such method.
    fn respond(&mut self, method: &str, args: &[Value]) -> Option<Result<Value>>;

    /// Check whether `method` would be handled by [`respond`](Respond::respond).
    fn responds_to(&self, method: &str) -> bool;

    /// Name used for this receiver in error messages.
    fn receiver_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Invoke `method`, failing with [`Error::UnsupportedMethod`] if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for unknown names, or whatever
    /// error the method itself produced.
    fn dispatch(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        match self.respond(method, args) {
            Some(result) => result,
            None => Err(Error::unsupported(self.receiver_name(), method)),
        }
    }
}

/// The blank placeholder object: responds to nothing.
impl Respond for () {
    fn respond(&mut self, _method: &str, _args: &[Value]) -> Option<Result<Value>> {
        None
    }

    fn responds_to(&self, _method: &str) -> bool {
        false
    }

    fn receiver_name(&self) -> String {
        "blank object".to_string()
    }
}

impl<T: Respond + ?Sized> Respond for Box<T> {
    fn respond(&mut self, method: &str, args: &[Value]) -> Option<Result<Value>> {
        (**self).respond(method, args)
    }

    fn responds_to(&self, method: &str) -> bool {
        (**self).responds_to(method)
    }

    fn receiver_name(&self) -> String {
        (**self).receiver_name()
    }
}

impl<T: Respond + ?Sized> Respond for &mut T {
    fn respond(&mut self, method: &str, args: &[Value]) -> Option<Result<Value>> {
        (**self).respond(method, args)
    }

    fn responds_to(&self, method: &str) -> bool {
        (**self).responds_to(method)
    }

    fn receiver_name(&self) -> String {
        (**self).receiver_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl Respond for Echo {
        fn respond(&mut self, method: &str, args: &[Value]) -> Option<Result<Value>> {
            (method == "echo").then(|| Ok(args.first().cloned().unwrap_or(Value::Null)))
        }

        fn responds_to(&self, method: &str) -> bool {
            method == "echo"
        }
    }

    #[test]
    fn test_blank_object_responds_to_nothing() {
        let mut blank = ();
        assert!(!blank.responds_to("anything"));
        let err = blank.dispatch("anything", &[]).unwrap_err();
        assert_eq!(err.to_string(), "undefined method `anything` for blank object");
    }

    #[test]
    fn test_dispatch_passes_through_known_method() {
        let mut echo = Echo;
        assert_eq!(echo.dispatch("echo", &[json!("hi")]).unwrap(), json!("hi"));
    }

    #[test]
    fn test_receiver_name_defaults_to_type_name() {
        let echo = Echo;
        assert!(echo.receiver_name().ends_with("Echo"));
    }

    #[test]
    fn test_boxed_and_borrowed_targets_forward() {
        let mut boxed: Box<dyn Respond> = Box::new(Echo);
        assert!(boxed.responds_to("echo"));
        assert_eq!(boxed.dispatch("echo", &[json!(1)]).unwrap(), json!(1));

        let mut echo = Echo;
        let mut borrowed: &mut Echo = &mut echo;
        let err = Respond::dispatch(&mut borrowed, "missing", &[]).unwrap_err();
        assert!(err.is_unsupported());
    }
}
