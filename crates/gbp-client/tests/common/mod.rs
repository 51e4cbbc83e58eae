#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use gbp_client::{ApiClient, BUSINESS_MANAGE_SCOPE, Credential, GbpConfig, TokenStore};
use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

/// A mock upstream plus credential files in a temp dir.
///
/// The redirect URI points at a port held by this struct, so an unexpected
/// consent flow fails fast instead of waiting for a browser.
pub struct TestEnv {
    pub server: MockServer,
    pub dir: TempDir,
    pub config: GbpConfig,
    _redirect_blocker: TcpListener,
}

impl TestEnv {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let credentials_file = dir.path().join("credentials.json");
        std::fs::write(
            &credentials_file,
            json!({
                "installed": {
                    "client_id": "test-client.apps.googleusercontent.com",
                    "client_secret": "test-secret",
                    "auth_uri": format!("{}/auth", server.uri()),
                    "token_uri": format!("{}/token", server.uri()),
                }
            })
            .to_string(),
        )
        .unwrap();

        let blocker = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = blocker.local_addr().unwrap().port();

        let config = GbpConfig::default()
            .with_credentials_file(credentials_file)
            .with_token_file(dir.path().join("token.json"))
            .with_redirect_uri(format!("http://127.0.0.1:{port}/callback"))
            .with_business_api_url(format!("{}/v4", server.uri()))
            .with_performance_api_url(format!("{}/v1", server.uri()))
            .with_revoke_url(format!("{}/revoke", server.uri()))
            .with_timeout(Duration::from_secs(5))
            .with_callback_timeout(Duration::from_secs(1))
            .with_open_browser(false);

        Self {
            server,
            dir,
            config,
            _redirect_blocker: blocker,
        }
    }

    pub fn token_path(&self) -> PathBuf {
        self.config.token_file.clone()
    }

    /// Stores a token that expires `expires_in_secs` from now (negative for
    /// an already expired token).
    pub fn store_token(&self, access_token: &str, expires_in_secs: i64) {
        let credential = Credential {
            access_token: access_token.to_string(),
            refresh_token: Some("refresh-token".to_string()),
            expiry: Some(Utc::now() + chrono::Duration::seconds(expires_in_secs)),
            scopes: vec![BUSINESS_MANAGE_SCOPE.to_string()],
        };
        TokenStore::new(self.token_path()).save(&credential).unwrap();
    }

    pub fn stored_token(&self) -> Option<Credential> {
        TokenStore::new(self.token_path()).load().unwrap()
    }

    /// A client authenticated with a valid stored token `access_token`.
    pub async fn client(&self, access_token: &str) -> ApiClient {
        self.store_token(access_token, 3600);
        let client = ApiClient::new(self.config.clone()).unwrap();
        client.authenticate().await.unwrap();
        client
    }
}
