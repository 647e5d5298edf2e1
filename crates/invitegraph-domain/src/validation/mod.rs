//! Input validation for client-supplied values.
//!
//! Validation happens before any upstream call is made.

use crate::error::{DomainError, DomainResult};
use crate::model::{Profile, ProfileId};

/// Minimum number of characters in a search query.
pub const MIN_QUERY_LEN: usize = 2;

/// Validates a search query, returning it unchanged when acceptable.
///
/// The length is counted in characters, not bytes.
pub fn validate_search_query(query: Option<&str>) -> DomainResult<&str> {
    match query {
        Some(q) if q.chars().count() >= MIN_QUERY_LEN => Ok(q),
        _ => Err(DomainError::QueryTooShort {
            min_len: MIN_QUERY_LEN,
        }),
    }
}

/// Parses a profile id taken from a request path.
pub fn parse_profile_id(raw: &str) -> DomainResult<ProfileId> {
    raw.parse()
}

/// Checks that a profile submitted as a recent search carries a profile id.
pub fn validate_recent_search(profile: &Profile) -> DomainResult<ProfileId> {
    profile
        .profile_id
        .ok_or_else(|| DomainError::InvalidProfileId {
            value: "missing profileId".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_shorter_than_two_characters_is_rejected() {
        assert!(matches!(
            validate_search_query(None),
            Err(DomainError::QueryTooShort { min_len: 2 })
        ));
        assert!(validate_search_query(Some("")).is_err());
        assert!(validate_search_query(Some("a")).is_err());
    }

    #[test]
    fn test_query_of_two_characters_is_accepted() {
        assert_eq!(validate_search_query(Some("al")).unwrap(), "al");
        assert_eq!(validate_search_query(Some("é")).ok(), None);
        assert_eq!(validate_search_query(Some("éé")).unwrap(), "éé");
    }

    #[test]
    fn test_parse_profile_id() {
        assert_eq!(parse_profile_id("42").unwrap(), ProfileId::new(42));
        assert!(matches!(
            parse_profile_id("abc"),
            Err(DomainError::InvalidProfileId { .. })
        ));
    }

    #[test]
    fn test_recent_search_requires_profile_id() {
        let mut profile = Profile::default();
        assert!(validate_recent_search(&profile).is_err());

        profile.profile_id = Some(ProfileId::new(5));
        assert_eq!(validate_recent_search(&profile).unwrap(), ProfileId::new(5));
    }
}
