//! Typed ID definitions for compute resources.

use crate::{define_generated_id, define_resource_id};

// =============================================================================
// Compute Resources
// =============================================================================

define_resource_id!(ServerId);
define_resource_id!(ImageId);
define_resource_id!(FlavorId);

impl ServerId {
    /// A fresh UUID-shaped server ID, as the API would assign.
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

// =============================================================================
// Requests
// =============================================================================

define_generated_id!(RequestId, "req");

// =============================================================================
// Names
// =============================================================================

/// Generate a unique resource name with the given prefix.
///
/// Names are user-controlled labels, so uniqueness only matters for telling
/// concurrent runs apart in the API's listing.
#[must_use]
pub fn random_name(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..12])
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_server_id_roundtrip() {
        let raw = "8c3b5f0e-5f2d-4b1e-9a57-3f0f4f8d2b11";
        let id: ServerId = raw.parse().unwrap();
        assert_eq!(id.as_str(), raw);
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_server_id_empty() {
        let result: Result<ServerId, _> = "".parse();
        assert!(matches!(result.unwrap_err(), crate::IdError::Empty));
    }

    #[test]
    fn test_server_id_rejects_path_characters() {
        for bad in ["abc/def", "abc def", "abc?x=1", "abc#frag"] {
            let result = ServerId::parse(bad);
            assert!(
                matches!(result, Err(crate::IdError::InvalidCharacter { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_server_id_json_roundtrip() {
        let id = ServerId::parse("srv-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"srv-1\"");
        let parsed: ServerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_server_id_json_rejects_empty() {
        let result: Result<ServerId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_request_id_prefix() {
        let id = RequestId::new();
        assert!(id.to_string().starts_with("req_"));
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_request_id_invalid_prefix() {
        let result = RequestId::parse("srv_01HV4Z2WQXKJNM8GPQY6VBKC3D");
        assert!(matches!(
            result,
            Err(crate::IdError::InvalidPrefix { expected: "req", .. })
        ));
    }

    #[test]
    fn test_request_id_invalid_ulid() {
        let result = RequestId::parse("req_invalid");
        assert!(matches!(result, Err(crate::IdError::InvalidUlid(_))));
    }

    #[test]
    fn test_random_server_id_parses_back() {
        let id = ServerId::random();
        assert_eq!(ServerId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_random_name_unique() {
        let a = random_name("roast");
        let b = random_name("roast");
        assert!(a.starts_with("roast-"));
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_url_safe_ids_parse(s in "[A-Za-z0-9._~-]{1,64}") {
            let id = ServerId::parse(&s).unwrap();
            prop_assert_eq!(id.as_str(), s.as_str());
        }

        #[test]
        fn prop_ids_with_slash_rejected(a in "[a-z0-9]{0,8}", b in "[a-z0-9]{0,8}") {
            let s = format!("{a}/{b}");
            prop_assert!(ServerId::parse(&s).is_err());
        }
    }
}
