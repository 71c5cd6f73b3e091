//! OpenID Connect provider settings.
//!
//! The console signs administrators in through an external OIDC provider
//! (Google, Keycloak, Authentik, ...). Only the standard `sub`, `email`, and
//! `name` claims are consumed; authorization comes from the directory.

use serde::{Deserialize, Serialize};

/// Settings for the federated identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// Issuer URL used for discovery (e.g. "https://accounts.google.com").
    issuer_url: String,
    /// OAuth2 client ID registered with the provider.
    client_id: String,
    /// OAuth2 client secret.
    client_secret: String,
    /// Callback URL (e.g. "https://admin.example.com/auth/callback").
    redirect_uri: String,
    /// Comma-separated scopes. Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// `prompt` parameter sent with the authorization request.
    /// Default: "select_account", so a shared browser can switch accounts.
    #[serde(default = "default_prompt")]
    prompt: String,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

fn default_prompt() -> String {
    "select_account".to_string()
}

impl OidcConfig {
    /// Creates a configuration with default scopes and prompt.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self::builder(issuer_url, client_id, client_secret, redirect_uri).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> OidcConfigBuilder {
        OidcConfigBuilder::new(issuer_url, client_id, client_secret, redirect_uri)
    }

    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the scopes to request, skipping blanks.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the `prompt` parameter, or `None` if it is blank.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        let prompt = self.prompt.trim();
        (!prompt.is_empty()).then_some(prompt)
    }
}

/// Builder for [`OidcConfig`].
#[derive(Debug)]
pub struct OidcConfigBuilder {
    issuer_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    prompt: String,
}

impl OidcConfigBuilder {
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes().split(',').map(str::to_string).collect(),
            prompt: default_prompt(),
        }
    }

    /// Adds a scope unless it is already requested.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Sets the `prompt` parameter. An empty string omits it.
    #[must_use]
    pub fn prompt(mut self, prompt: String) -> Self {
        self.prompt = prompt;
        self
    }

    #[must_use]
    pub fn build(self) -> OidcConfig {
        OidcConfig {
            issuer_url: self.issuer_url,
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes.join(","),
            prompt: self.prompt,
        }
    }
}
