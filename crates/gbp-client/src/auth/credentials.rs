//! OAuth client secrets.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{GbpError, GbpResult};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth 2.0 client credentials for the installed-app flow.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    /// Consent page endpoint.
    pub auth_uri: String,
    /// Code exchange and refresh endpoint.
    pub token_uri: String,
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Google's client-secret JSON.
///
/// Accepts the Cloud Console shape with an `installed` or `web` section, and a
/// flat shape with the fields at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedSecrets>,
    web: Option<NestedSecrets>,
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    auth_uri: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ClientSecrets {
    /// Creates secrets using Google's default endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: GOOGLE_AUTH_URL.to_string(),
            token_uri: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Reads a client-secret JSON file.
    ///
    /// A missing or malformed file is an authentication error: nothing can be
    /// authorized without it.
    pub fn from_file(path: impl AsRef<Path>) -> GbpResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GbpError::auth(format!("credentials file not found: {}", path.display()))
            } else {
                GbpError::auth(format!(
                    "failed to read credentials file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_json(&content)
    }

    /// Parses a client-secret JSON document.
    pub fn from_json(json: &str) -> GbpResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| GbpError::auth(format!("failed to parse credentials JSON: {}", e)))?;

        let (client_id, client_secret, auth_uri, token_uri) =
            if let Some(nested) = file.installed.or(file.web) {
                (
                    nested.client_id,
                    nested.client_secret,
                    nested.auth_uri,
                    nested.token_uri,
                )
            } else if let (Some(id), Some(secret)) = (file.client_id, file.client_secret) {
                (id, secret, file.auth_uri, file.token_uri)
            } else {
                return Err(GbpError::auth(
                    "credentials file must contain an 'installed'/'web' section or 'client_id'/'client_secret' at root level",
                ));
            };

        let mut secrets = Self::new(client_id, client_secret);
        if let Some(uri) = auth_uri {
            secrets.auth_uri = uri;
        }
        if let Some(uri) = token_uri {
            secrets.token_uri = uri;
        }
        secrets.validate()?;
        Ok(secrets)
    }

    /// Rejects empty identifiers; warns on a client id that does not look
    /// like a Google one.
    pub fn validate(&self) -> GbpResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(GbpError::auth("client_id is required"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(GbpError::auth("client_secret is required"));
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            warn!(
                client_id = %self.client_id,
                "client_id does not end with .apps.googleusercontent.com"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_installed_format() {
        let json = r#"{
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "client_secret": "shh",
                "project_id": "bakery",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret, "shh");
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URL);
    }

    #[test]
    fn parse_web_format_with_custom_token_uri() {
        let json = r#"{"web": {"client_id": "web.apps.googleusercontent.com", "client_secret": "s", "token_uri": "http://127.0.0.1:9/token"}}"#;
        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.token_uri, "http://127.0.0.1:9/token");
        assert_eq!(secrets.auth_uri, GOOGLE_AUTH_URL);
    }

    #[test]
    fn parse_flat_format() {
        let json = r#"{"client_id": "flat.apps.googleusercontent.com", "client_secret": "s"}"#;
        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.client_id, "flat.apps.googleusercontent.com");
    }

    #[test]
    fn missing_fields_is_auth_error() {
        let err = ClientSecrets::from_json(r#"{"project_id": "x"}"#).unwrap_err();
        assert!(err.is_auth());

        let err = ClientSecrets::from_json(r#"{"installed": {"client_id": "", "client_secret": "s"}}"#)
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn malformed_json_is_auth_error() {
        assert!(ClientSecrets::from_json("not json").unwrap_err().is_auth());
    }

    #[test]
    fn missing_file_is_auth_error() {
        let err = ClientSecrets::from_file("/nonexistent/credentials.json").unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn debug_redacts_secret() {
        let secrets = ClientSecrets::new("id", "super-secret");
        assert!(!format!("{secrets:?}").contains("super-secret"));
    }
}
