//! Federated identity provider descriptors and matching

use serde::Deserialize;

/// A federated identity provider advertised by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FederatedProvider {
    /// Backend-side name of the provider, passed back on sign-in.
    pub name: String,
    /// Issuer URL of the identity authority.
    pub issuer: String,
    /// OAuth-style client identifier the provider was registered for.
    pub audience: String,
}

/// Resolve the provider whose audience matches the locally configured
/// client id and whose issuer matches the expected identity authority.
///
/// When several providers match, the last one listed wins. The result
/// gates whether federated sign-in is offered at all.
#[must_use]
pub fn resolve_active_provider<'a>(
    providers: &'a [FederatedProvider],
    client_id: &str,
    issuer: &str,
) -> Option<&'a str> {
    providers
        .iter()
        .filter(|p| p.issuer == issuer && p.audience == client_id)
        .next_back()
        .map(|p| p.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOGLE_ISSUER: &str = "https://accounts.google.com";

    fn provider(name: &str, issuer: &str, audience: &str) -> FederatedProvider {
        FederatedProvider {
            name: name.to_string(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        }
    }

    #[test]
    fn test_resolves_matching_provider() {
        let providers = vec![
            provider("g1", GOOGLE_ISSUER, "CID"),
            provider("g2", GOOGLE_ISSUER, "OTHER"),
        ];
        assert_eq!(
            resolve_active_provider(&providers, "CID", GOOGLE_ISSUER),
            Some("g1")
        );
    }

    #[test]
    fn test_no_match_yields_none() {
        let providers = vec![provider("g2", GOOGLE_ISSUER, "OTHER")];
        assert_eq!(resolve_active_provider(&providers, "CID", GOOGLE_ISSUER), None);
        assert_eq!(resolve_active_provider(&[], "CID", GOOGLE_ISSUER), None);
    }

    #[test]
    fn test_issuer_must_match() {
        let providers = vec![provider("g1", "https://evil.example.com", "CID")];
        assert_eq!(resolve_active_provider(&providers, "CID", GOOGLE_ISSUER), None);
    }

    #[test]
    fn test_last_match_wins() {
        let providers = vec![
            provider("first", GOOGLE_ISSUER, "CID"),
            provider("second", GOOGLE_ISSUER, "CID"),
        ];
        assert_eq!(
            resolve_active_provider(&providers, "CID", GOOGLE_ISSUER),
            Some("second")
        );
    }
}
