pub mod errors;
pub mod db;
pub mod enums;
pub mod schema;
pub mod validation;

pub mod tenant;
pub mod user;
pub mod user_credentials;
pub mod password_reset_token;

pub mod category;
pub mod subscriber;
pub mod news;
pub mod event;
pub mod product;
pub mod comment;
pub mod order;
pub mod order_item;
pub mod contract;
pub mod audit_log;

pub use enums::*;
pub use schema::SchemaTolerant;

use errors::ModelError;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn empty_array() -> serde_json::Value {
    serde_json::json!([])
}

/// JSON list columns (gallery, related links, tags) must hold an array of strings.
pub fn validate_string_array(value: &serde_json::Value, field: &str) -> Result<(), ModelError> {
    match value {
        serde_json::Value::Array(items) if items.iter().all(|v| v.is_string()) => Ok(()),
        serde_json::Value::Null => Ok(()),
        _ => Err(ModelError::Validation(format!("{field} must be a list of strings"))),
    }
}

#[cfg(test)]
mod tests;

#[cfg(test)]
mod helper_tests {
    use serde_json::json;

    #[test]
    fn string_arrays() {
        assert!(super::validate_string_array(&json!(["a.jpg", "b.jpg"]), "gallery").is_ok());
        assert!(super::validate_string_array(&json!([]), "gallery").is_ok());
        assert!(super::validate_string_array(&json!([1, 2]), "gallery").is_err());
        assert!(super::validate_string_array(&json!({"a": 1}), "tags").is_err());
    }
}
