//! Conversions between dynamic arguments and native parameter types.
//!
//! These are the helpers code generated by `#[responds]` calls into. They are
//! public so hand-written [`Respond`](super::Respond) impls can use them too.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Value;
use crate::error::{Error, Result};

/// Fail unless exactly `expected` arguments were supplied.
///
/// # Errors
///
/// Returns [`Error::WrongArity`] on a count mismatch.
pub fn check_arity(method: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::wrong_arity(method, expected, args.len()))
    }
}

/// Decode the argument at `index` into `T`.
///
/// # Errors
///
/// Returns [`Error::WrongArity`] if there is no argument at `index`, or
/// [`Error::InvalidArgument`] if it does not deserialize into `T`.
pub fn decode_arg<T: DeserializeOwned>(method: &str, args: &[Value], index: usize) -> Result<T> {
    let raw = args
        .get(index)
        .ok_or_else(|| Error::wrong_arity(method, index + 1, args.len()))?;
    serde_json::from_value(raw.clone()).map_err(|source| Error::InvalidArgument {
        method: method.to_string(),
        index,
        source,
    })
}

/// Encode a native return value.
///
/// # Errors
///
/// Returns [`Error::InvalidReturn`] if `value` cannot be represented as a [`Value`].
pub fn encode_return<T: Serialize>(method: &str, value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|source| Error::InvalidReturn {
        method: method.to_string(),
        source,
    })
}

/// Short name of a value's JSON type, for error messages.
#[must_use]
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_arity() {
        assert!(check_arity("greet", &[], 0).is_ok());
        let err = check_arity("greet", &[json!(1)], 0).unwrap_err();
        assert!(matches!(
            err,
            Error::WrongArity {
                expected: 0,
                given: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_arg() {
        let args = [json!(3), json!("x")];
        let n: u32 = decode_arg("repeat", &args, 0).unwrap();
        let s: String = decode_arg("repeat", &args, 1).unwrap();
        assert_eq!(n, 3);
        assert_eq!(s, "x");
    }

    #[test]
    fn test_decode_arg_type_mismatch() {
        let err = decode_arg::<u32>("repeat", &[json!("three")], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { index: 0, .. }));
    }

    #[test]
    fn test_decode_arg_missing() {
        let err = decode_arg::<u32>("repeat", &[], 0).unwrap_err();
        assert!(matches!(err, Error::WrongArity { .. }));
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of(&json!(null)), "null");
        assert_eq!(kind_of(&json!([1])), "array");
        assert_eq!(kind_of(&json!({"a": 1})), "object");
    }

    #[test]
    fn test_encode_return() {
        assert_eq!(encode_return("unit", ()).unwrap(), Value::Null);
        assert_eq!(encode_return("list", vec![1, 2]).unwrap(), json!([1, 2]));
        assert_eq!(encode_return("opt", None::<u8>).unwrap(), Value::Null);
    }
}
