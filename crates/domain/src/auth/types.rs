//! Session credential and authentication error types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session credentials issued by the backend.
///
/// The access and refresh tokens are always issued together; a session
/// either holds both or holds nothing, which is why this struct has no
/// optional token fields. Replacement is always wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Short-lived bearer token used to authorize API calls.
    pub access_token: String,
    /// Longer-lived token used solely to obtain a new access token.
    pub refresh_token: String,
    /// When the access token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Check if the access token is expired or will expire within the
    /// given buffer, measured from `now`.
    #[must_use]
    pub fn is_expired_or_expiring(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            let buffer = chrono::Duration::seconds(buffer_seconds);
            now + buffer >= expires_at
        })
    }

    /// Time until expiry in seconds, or None if no expiry is known.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|exp| (exp - now).num_seconds())
    }

    /// Returns the `Authorization` header value for this session.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Minimal identity of the signed-in user.
///
/// Present if and only if [`Credentials`] are present; both are derived
/// from the same server response and cleared together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable user identifier.
    pub id: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Avatar image URL, if the identity provider supplied one.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Email address, if the identity provider supplied one.
    #[serde(default)]
    pub email: Option<String>,
}

/// Token issuance payload returned by the backend on sign-in, sign-up,
/// and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentials {
    /// The user the credentials were issued for.
    pub user: User,
    /// New access token.
    pub access_token: String,
    /// New refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl UserCredentials {
    /// Split the payload into session state, anchoring the expiry to `now`.
    #[must_use]
    pub fn into_session(self, now: DateTime<Utc>) -> (Credentials, User) {
        let credentials = Credentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Some(now + chrono::Duration::seconds(self.expires_in)),
        };
        (credentials, self.user)
    }
}

/// Typed authentication error returned by the backend.
///
/// Transient and UI-facing; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthError {
    /// What went wrong, as a closed set of backend-defined kinds.
    #[serde(rename = "error")]
    pub kind: AuthErrorKind,
    /// Raw human-readable detail from the backend.
    pub detail: String,
}

impl AuthError {
    /// User-facing copy for this error, keyed by kind with the raw detail
    /// string as fallback for kinds we have no copy for.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self.kind {
            AuthErrorKind::UserAlreadySignedUp => {
                "A user has already signed up with that account. You can try signing in instead."
            }
            AuthErrorKind::UserNotSignedUp => {
                "There is no account associated with that sign in. You can try signing up instead."
            }
            AuthErrorKind::InvalidFederatedCredential => {
                "There was a problem with the response from the sign in provider. Please try again."
            }
            AuthErrorKind::InvalidCredential
            | AuthErrorKind::NoSuchFederatedIdentityProvider
            | AuthErrorKind::Other => &self.detail,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for AuthError {}

/// Kinds of authentication error the backend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthErrorKind {
    /// A presented application credential was rejected.
    InvalidCredential,
    /// The federated identity provider's credential was rejected.
    InvalidFederatedCredential,
    /// The named federated identity provider is not known to the backend.
    NoSuchFederatedIdentityProvider,
    /// Sign-up attempted for an account that already exists.
    UserAlreadySignedUp,
    /// Sign-in attempted for an account that does not exist.
    UserNotSignedUp,
    /// A kind this client does not recognize; the detail string still applies.
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload() -> UserCredentials {
        UserCredentials {
            user: User {
                id: "user-1".to_string(),
                display_name: "Ada".to_string(),
                avatar_url: None,
                email: Some("ada@example.com".to_string()),
            },
            access_token: "access123".to_string(),
            refresh_token: "refresh456".to_string(),
            expires_in: 3600,
        }
    }

    #[test]
    fn test_into_session_anchors_expiry() {
        let now = Utc::now();
        let (credentials, user) = payload().into_session(now);

        assert_eq!(credentials.access_token, "access123");
        assert_eq!(credentials.refresh_token, "refresh456");
        assert_eq!(
            credentials.expires_at,
            Some(now + chrono::Duration::seconds(3600))
        );
        assert_eq!(user.id, "user-1");
    }

    #[test]
    fn test_credentials_expiry_buffer() {
        let now = Utc::now();
        let (credentials, _) = payload().into_session(now);

        assert!(!credentials.is_expired_or_expiring(now, 0));
        assert!(!credentials.is_expired_or_expiring(now, 3599));
        assert!(credentials.is_expired_or_expiring(now, 3600));
        assert_eq!(credentials.seconds_until_expiry(now), Some(3600));
    }

    #[test]
    fn test_credentials_without_expiry_never_expire() {
        let credentials = Credentials {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: None,
        };
        assert!(!credentials.is_expired_or_expiring(Utc::now(), i64::MAX / 2));
        assert!(credentials.seconds_until_expiry(Utc::now()).is_none());
    }

    #[test]
    fn test_authorization_header() {
        let (credentials, _) = payload().into_session(Utc::now());
        assert_eq!(credentials.authorization_header(), "Bearer access123");
    }

    #[test]
    fn test_auth_error_kind_wire_names() {
        let error: AuthError = serde_json::from_str(
            r#"{"error": "USER_NOT_SIGNED_UP", "detail": "no such user"}"#,
        )
        .unwrap();
        assert_eq!(error.kind, AuthErrorKind::UserNotSignedUp);
        assert_eq!(error.detail, "no such user");
    }

    #[test]
    fn test_unrecognized_auth_error_kind_falls_back_to_detail() {
        let error: AuthError = serde_json::from_str(
            r#"{"error": "QUOTA_EXCEEDED", "detail": "too many sign ins"}"#,
        )
        .unwrap();
        assert_eq!(error.kind, AuthErrorKind::Other);
        assert_eq!(error.user_message(), "too many sign ins");
    }

    #[test]
    fn test_user_message_copy_for_known_kinds() {
        let error = AuthError {
            kind: AuthErrorKind::UserAlreadySignedUp,
            detail: "raw detail".to_string(),
        };
        assert!(error.user_message().contains("already signed up"));

        let error = AuthError {
            kind: AuthErrorKind::InvalidFederatedCredential,
            detail: "raw detail".to_string(),
        };
        assert!(error.user_message().contains("sign in provider"));
    }
}
