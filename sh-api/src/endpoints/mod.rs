//! Typed endpoint methods organized by table.
//!
//! Each module adds `ApiClient` methods for a group of related tables or
//! stored procedures.

pub mod profiles;
pub mod providers;
pub mod conversations;
pub mod bookings;
pub mod wallet;
pub mod geo;
pub mod tables;

/// Encode a record id as an RPC argument: numeric ids go out as numbers so
/// integer-typed procedure parameters accept them.
pub(crate) fn id_arg(id: &str) -> serde_json::Value {
    match id.parse::<i64>() {
        Ok(n) => serde_json::Value::from(n),
        Err(_) => serde_json::Value::from(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_arg() {
        assert_eq!(id_arg("42"), serde_json::json!(42));
        assert_eq!(
            id_arg("6f1c9a1e-0000-4000-8000-000000000000"),
            serde_json::json!("6f1c9a1e-0000-4000-8000-000000000000")
        );
    }
}
