//! OIDC client implementation using the openidconnect crate.

use super::provider::Authenticator;
use async_trait::async_trait;
use ignitus_platform_access::{IdentityAssertion, IdentityProviderError, OidcConfig};
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse,
};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// OIDC client for authenticating administrators.
pub struct OidcClient {
    client: DiscoveredClient,
    http_client: reqwest::Client,
    config: OidcConfig,
}

/// Data needed to complete the OIDC callback, kept in a short-lived cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

impl OidcClient {
    /// Creates a new OIDC client by discovering the provider metadata.
    pub async fn discover(config: OidcConfig) -> Result<Self, OidcError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid issuer URL: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                OidcError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| OidcError::Discovery(format!("failed to discover provider: {}", e)))?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid redirect URI: {}", e)))?;

        let client = CoreClient::from_provider_metadata(
            provider_metadata,
            ClientId::new(config.client_id().to_string()),
            Some(ClientSecret::new(config.client_secret().to_string())),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            client,
            http_client,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }
}

#[async_trait]
impl Authenticator for OidcClient {
    fn authorization_url(&self) -> (String, AuthState) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in self.config.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }
        if let Some(prompt) = self.config.prompt() {
            auth_request = auth_request.add_extra_param("prompt", prompt.to_string());
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<IdentityAssertion, Report<IdentityProviderError>> {
        let token_request = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| IdentityProviderError::Unavailable {
                reason: format!("token endpoint error: {}", e),
            })?;

        let token_response = token_request
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| IdentityProviderError::Rejected {
                reason: format!("token exchange failed: {}", e),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| IdentityProviderError::Rejected {
                reason: "no ID token in response".to_string(),
            })?;

        let nonce = Nonce::new(state.nonce.clone());
        let claims = id_token
            .claims(&self.client.id_token_verifier(), &nonce)
            .map_err(|e| IdentityProviderError::Rejected {
                reason: format!("ID token validation failed: {}", e),
            })?;

        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .ok_or_else(|| IdentityProviderError::MissingClaim {
                claim: "email".to_string(),
            })?;

        // The allow-list is keyed by email, so an unverified address proves nothing.
        if claims.email_verified() == Some(false) {
            return Err(IdentityProviderError::Rejected {
                reason: "email address is not verified".to_string(),
            }
            .into());
        }

        let display_name = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string())
            .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string()))
            .unwrap_or_else(|| email.clone());

        tracing::debug!(subject = %claims.subject().as_str(), "ID token verified");

        Ok(IdentityAssertion::new(
            claims.subject().as_str(),
            email,
            display_name,
        ))
    }
}

/// OIDC setup errors.
#[derive(Debug)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
        }
    }
}

impl std::error::Error for OidcError {}
