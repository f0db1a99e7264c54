//! Endpoint handlers.
//!
//! Each handler opens a `RequestScope`, runs its operation and hands the
//! result back to the scope, which builds the response.

pub mod posts;
pub mod system;
pub mod users;

use std::collections::HashMap;

use crate::http::error::ApiError;

/// Query string as a flat map.
pub type Params = HashMap<String, String>;

/// Read an integer id parameter. `label` names it in error bodies.
pub fn parse_id(params: &Params, key: &str, label: &'static str) -> Result<i64, ApiError> {
    let raw = params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingParameter(label))?;
    raw.parse().map_err(|_| ApiError::InvalidParameter(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(&params(&[("id", "42")]), "id", "user id").unwrap(), 42);
        assert!(matches!(
            parse_id(&params(&[]), "id", "user id"),
            Err(ApiError::MissingParameter("user id"))
        ));
        assert!(matches!(
            parse_id(&params(&[("id", "")]), "id", "user id"),
            Err(ApiError::MissingParameter(_))
        ));
        assert!(matches!(
            parse_id(&params(&[("id", "abc")]), "id", "user id"),
            Err(ApiError::InvalidParameter("user id"))
        ));
    }
}
