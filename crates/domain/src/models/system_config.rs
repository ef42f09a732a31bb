//! System configuration flags stored in the `system_config` table.

use serde_json::Value;

/// Key of the global registration open/closed flag.
pub const REGISTRATION_OPEN_KEY: &str = "registration_open";

/// Interprets the stored `registration_open` value.
///
/// A missing row means open; a present row is open only when it holds
/// JSON `true`.
pub fn registration_open_from_value(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) => v.as_bool() == Some(true),
    }
}
