//! OAuth 2.0 authorization-code flow with PKCE over a loopback redirect.
//!
//! # Flow Overview
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a random `state`
//! 2. Bind a listener on the host/port of the configured redirect URI
//! 3. Open the consent page (and print its URL)
//! 4. Google redirects the browser to the listener with `code` and `state`
//! 5. Exchange the code (with the verifier) for access and refresh tokens
//!
//! Refresh and revocation share the same HTTP client.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::config::GbpConfig;
use crate::error::{GbpError, GbpResult};

use super::credentials::ClientSecrets;
use super::tokens::Credential;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// How often the callback listener is polled for a connection.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Read timeout for a single callback request.
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// OAuth client for the token endpoint and the consent flow.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    secrets: ClientSecrets,
    http_client: reqwest::Client,
    callback_timeout: Duration,
    open_browser: bool,
}

impl OAuthClient {
    pub fn new(secrets: ClientSecrets, config: &GbpConfig) -> GbpResult<Self> {
        Ok(Self {
            secrets,
            http_client: config.http_client()?,
            callback_timeout: config.callback_timeout(),
            open_browser: config.open_browser,
        })
    }

    pub fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    /// Runs the interactive consent flow for `pkce` and returns the granted
    /// credential.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if:
    /// - The redirect URI cannot be bound locally
    /// - The user denies consent or the callback times out
    /// - The returned `state` does not match
    /// - The token endpoint rejects the code
    pub async fn authorize(
        &self,
        pkce: PkceFlow,
        redirect_uri: &str,
        scopes: &[String],
    ) -> GbpResult<Credential> {
        let target = RedirectTarget::parse(redirect_uri)?;
        let listener = target.bind()?;

        let auth_url = pkce.build_auth_url(
            &self.secrets.auth_uri,
            &self.secrets.client_id,
            redirect_uri,
            scopes,
        );

        info!("starting OAuth consent flow");
        eprintln!("\nOpen this URL in your browser to authorize access:\n\n{}\n", auth_url);
        if self.open_browser {
            if let Err(e) = open::that(&auth_url) {
                warn!("failed to open browser: {}", e);
            }
        }

        let timeout = self.callback_timeout;
        let callback =
            tokio::task::spawn_blocking(move || wait_for_callback(listener, &target.path, timeout))
                .await
                .map_err(|e| GbpError::auth(format!("callback listener failed: {}", e)))??;
        if callback.state != pkce.state {
            return Err(GbpError::auth("OAuth state mismatch - possible CSRF attack"));
        }

        info!("received authorization code, exchanging for tokens");
        self.exchange_code(&callback.code, &pkce.verifier, redirect_uri, scopes)
            .await
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> GbpResult<TokenResponse> {
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.post_token_endpoint(&params, "token refresh").await?;
        info!("refreshed access token");
        Ok(response)
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> GbpResult<Credential> {
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.post_token_endpoint(&params, "token exchange").await?;
        info!("obtained tokens");

        let granted = response.granted_scopes().unwrap_or_else(|| scopes.to_vec());
        Ok(Credential::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            granted,
        ))
    }

    async fn post_token_endpoint(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> GbpResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.secrets.token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| GbpError::auth(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GbpError::auth(format!("failed to read {} response: {}", what, e)))?;

        if !status.is_success() {
            return Err(GbpError::auth(format!(
                "{} failed ({}): {}",
                what,
                status.as_u16(),
                oauth_error_message(&body)
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| GbpError::auth(format!("invalid {} response: {}", what, e)))
    }
}

/// Revokes `token` at `revoke_url`.
///
/// A 400 `invalid_token` answer means the token is already dead and counts as
/// success.
pub(crate) async fn revoke_token(
    http_client: &reqwest::Client,
    revoke_url: &str,
    token: &str,
) -> GbpResult<()> {
    let response = http_client
        .post(revoke_url)
        .form(&[("token", token)])
        .send()
        .await
        .map_err(|e| GbpError::auth(format!("revocation request failed: {}", e)))?;

    let status = response.status();
    if status.is_success() {
        info!("token revoked");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::BAD_REQUEST && body.contains("invalid_token") {
        debug!("token was already revoked or expired");
        return Ok(());
    }

    Err(GbpError::auth(format!(
        "revocation failed ({}): {}",
        status.as_u16(),
        oauth_error_message(&body)
    )))
}

/// Extracts `error`/`error_description` from an OAuth error body.
fn oauth_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct OAuthErrorBody {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    }

    match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(OAuthErrorBody {
            error,
            error_description: Some(description),
        }) => format!("{error}: {description}"),
        Ok(OAuthErrorBody { error, .. }) => error,
        Err(_) => body.trim().to_string(),
    }
}

/// Response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn granted_scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|scopes| !scopes.is_empty())
    }
}

/// Where the consent redirect lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl RedirectTarget {
    pub fn parse(redirect_uri: &str) -> GbpResult<Self> {
        let url = url::Url::parse(redirect_uri)
            .map_err(|e| GbpError::auth(format!("invalid redirect URI '{}': {}", redirect_uri, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| GbpError::auth(format!("redirect URI '{}' has no host", redirect_uri)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| GbpError::auth(format!("redirect URI '{}' has no port", redirect_uri)))?;

        Ok(Self {
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port,
            path: url.path().to_string(),
        })
    }

    /// Binds the loopback listener. `localhost` binds IPv4 loopback.
    pub fn bind(&self) -> GbpResult<TcpListener> {
        let host = if self.host == "localhost" {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };

        let listener = TcpListener::bind((host, self.port)).map_err(|e| {
            GbpError::auth(format!(
                "failed to bind callback listener on {}:{}: {}",
                host, self.port, e
            ))
        })?;
        debug!(host, port = self.port, "bound callback listener");
        Ok(listener)
    }
}

/// Parameters delivered to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// Waits for the consent redirect on `listener`.
///
/// Blocks the calling thread until the redirect arrives or `timeout` passes.
/// The listener is dropped on return, so the port is free again afterwards.
fn wait_for_callback(
    listener: TcpListener,
    path: &str,
    timeout: Duration,
) -> GbpResult<CallbackParams> {
    listener
        .set_nonblocking(true)
        .map_err(|e| GbpError::auth(format!("failed to configure callback listener: {}", e)))?;
    let deadline = Instant::now() + timeout;

    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(e) = stream
                    .set_nonblocking(false)
                    .and_then(|()| stream.set_read_timeout(Some(CALLBACK_READ_TIMEOUT)))
                {
                    error!("failed to configure callback connection: {}", e);
                    continue;
                }
                if let Some(result) = handle_callback(stream, path) {
                    return result;
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => error!("failed to accept connection: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(GbpError::auth(format!(
                "timed out after {}s waiting for the OAuth callback",
                timeout.as_secs()
            )));
        }
        thread::sleep(ACCEPT_POLL_INTERVAL.min(deadline - now));
    }
}

/// Handles one HTTP request on the callback listener.
///
/// Returns `None` for requests that are not the redirect (favicon and such).
fn handle_callback(mut stream: TcpStream, expected_path: &str) -> Option<GbpResult<CallbackParams>> {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return None;
    }
    // Drain headers so closing the socket does not reset the connection.
    let mut header = String::new();
    while reader.read_line(&mut header).is_ok_and(|n| n > 0) && !header.trim_end().is_empty() {
        header.clear();
    }

    // GET /callback?code=...&state=... HTTP/1.1
    let mut parts = request_line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        return None;
    };

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != expected_path {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return None;
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    let body = if error.is_some() || code.is_none() {
        "<html><body><h1>Authorization Failed</h1><p>You can close this window.</p></body></html>"
    } else {
        "<html><body><h1>Authorization Successful</h1>\
         <p>You can close this window and return to the terminal.</p></body></html>"
    };
    let status = if error.is_some() || code.is_none() {
        "400 Bad Request"
    } else {
        "200 OK"
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();

    if let Some(error) = error {
        return Some(Err(GbpError::auth(format!("authorization denied: {}", error))));
    }

    match code {
        Some(code) => Some(Ok(CallbackParams {
            code,
            state: state.unwrap_or_default(),
        })),
        None => Some(Err(GbpError::auth("missing authorization code in callback"))),
    }
}

/// PKCE flow state (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    /// High-entropy random string kept until the code exchange.
    pub verifier: String,
    /// SHA-256 of the verifier, base64url encoded.
    pub challenge: String,
    /// Random state echoed back by the redirect.
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = Self::generate_verifier();
        let challenge = Self::compute_challenge(&verifier);
        let state = Self::generate_state();

        Self {
            verifier,
            challenge,
            state,
        }
    }

    fn generate_verifier() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..CODE_VERIFIER_LENGTH).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    fn generate_state() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Builds the consent page URL requesting offline access.
    pub fn build_auth_url(
        &self,
        auth_uri: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            auth_uri,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}
