//! GraphQL implementation of the `TokenExchange` port.
//!
//! All three backend operations go through the `auth` namespace of a single
//! GraphQL endpoint as `{query, variables}` POSTs. The two mutations return
//! a union discriminated by `__typename`: either freshly minted
//! `UserCredentials` or a typed `AuthError` the application layer routes to
//! its error slots. Requests here are deliberately unauthenticated; these
//! calls mint the very tokens a bearer header would be built from.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use gatehouse_application::{ExchangeError, TokenExchange};
use gatehouse_domain::{AuthError, FederatedProvider, UserCredentials};

const FEDERATED_IDENTITY_PROVIDERS_QUERY: &str = "\
query FederatedIdentityProviders {
  auth {
    federatedIdentityProviders {
      name
      audience
      issuer
    }
  }
}";

const CREDENTIALS_FROM_FEDERATED_CREDENTIAL_MUTATION: &str = "\
mutation CredentialsFromFederatedCredential($provider: String!, $credential: String!, $isNewUser: Boolean!) {
  auth {
    credentialsFromFederatedCredential(provider: $provider, credential: $credential, isNewUser: $isNewUser) {
      __typename
      ... on UserCredentials {
        user {
          id
          displayName
          avatarUrl
          email
        }
        accessToken
        refreshToken
        expiresIn
      }
      ... on AuthError {
        error
        detail
      }
    }
  }
}";

const CREDENTIALS_FROM_REFRESH_TOKEN_MUTATION: &str = "\
mutation CredentialsFromRefreshToken($refreshToken: String!) {
  auth {
    credentialsFromRefreshToken(refreshToken: $refreshToken) {
      __typename
      ... on UserCredentials {
        user {
          id
          displayName
          avatarUrl
          email
        }
        accessToken
        refreshToken
        expiresIn
      }
      ... on AuthError {
        error
        detail
      }
    }
  }
}";

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AuthNamespace<T> {
    auth: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProvidersData {
    federated_identity_providers: Vec<FederatedProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FederatedCredentialData {
    credentials_from_federated_credential: CredentialsResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenData {
    credentials_from_refresh_token: CredentialsResult,
}

/// Union returned by the token-minting mutations.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum CredentialsResult {
    UserCredentials(UserCredentials),
    AuthError(AuthError),
}

impl CredentialsResult {
    fn into_result(self) -> Result<UserCredentials, ExchangeError> {
        match self {
            Self::UserCredentials(credentials) => Ok(credentials),
            Self::AuthError(error) => Err(ExchangeError::Auth(error)),
        }
    }
}

/// Token exchange client over a GraphQL endpoint.
pub struct GraphQlTokenExchange {
    client: Client,
    endpoint: String,
}

impl GraphQlTokenExchange {
    /// Creates a client for the given GraphQL endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Creates a client over a custom reqwest client.
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Executes one operation and unwraps the `auth` namespace.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: serde_json::Value,
    ) -> Result<T, ExchangeError> {
        debug!(endpoint = %self.endpoint, "sending token exchange operation");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Transport(format!(
                "token exchange endpoint answered {status}"
            )));
        }

        let envelope: GraphQlResponse<AuthNamespace<T>> = response
            .json()
            .await
            .map_err(|e| ExchangeError::Transport(format!("malformed response: {e}")))?;

        if let Some(error) = envelope.errors.first() {
            return Err(ExchangeError::Transport(error.message.clone()));
        }
        envelope
            .data
            .map(|data| data.auth)
            .ok_or_else(|| ExchangeError::Transport("response carried no data".to_string()))
    }
}

#[async_trait]
impl TokenExchange for GraphQlTokenExchange {
    async fn federated_identity_providers(
        &self,
    ) -> Result<Vec<FederatedProvider>, ExchangeError> {
        let data: ProvidersData = self
            .execute(FEDERATED_IDENTITY_PROVIDERS_QUERY, serde_json::json!({}))
            .await?;
        Ok(data.federated_identity_providers)
    }

    async fn credentials_from_federated_credential(
        &self,
        provider: &str,
        credential: &str,
        is_new_user: bool,
    ) -> Result<UserCredentials, ExchangeError> {
        let data: FederatedCredentialData = self
            .execute(
                CREDENTIALS_FROM_FEDERATED_CREDENTIAL_MUTATION,
                serde_json::json!({
                    "provider": provider,
                    "credential": credential,
                    "isNewUser": is_new_user,
                }),
            )
            .await?;
        data.credentials_from_federated_credential.into_result()
    }

    async fn refresh_credentials(
        &self,
        refresh_token: &str,
    ) -> Result<UserCredentials, ExchangeError> {
        let data: RefreshTokenData = self
            .execute(
                CREDENTIALS_FROM_REFRESH_TOKEN_MUTATION,
                serde_json::json!({ "refreshToken": refresh_token }),
            )
            .await?;
        data.credentials_from_refresh_token.into_result()
    }
}
