//! Naming conventions for generated accessors.
//!
//! A tracked field `name` is reachable through these dispatch names:
//!
//! | name              | behavior                              |
//! |-------------------|---------------------------------------|
//! | `name`            | reader                                |
//! | `name=`           | tracked writer                        |
//! | `name_changed?`   | per-field dirty query                 |
//! | `name?`           | flag query (boolean fields only)      |

/// Dispatch name of the tracked writer for `field`.
#[must_use]
pub fn writer_name(field: &str) -> String {
    format!("{field}=")
}

/// Dispatch name of the dirty query for `field`.
#[must_use]
pub fn changed_query_name(field: &str) -> String {
    format!("{field}_changed?")
}

/// Dispatch name of the flag query for a boolean `field`.
#[must_use]
pub fn flag_query_name(field: &str) -> String {
    format!("{field}?")
}
