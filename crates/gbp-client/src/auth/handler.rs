//! Credential lifecycle: load, refresh, consent, persist, revoke.

use tracing::{debug, info, warn};

use crate::config::GbpConfig;
use crate::error::{GbpError, GbpResult};

use super::credentials::ClientSecrets;
use super::oauth::{OAuthClient, PkceFlow, revoke_token};
use super::tokens::{BUSINESS_MANAGE_SCOPE, Credential, TokenStore};

/// Produces an [`AuthSession`] from the configured credential files.
#[derive(Debug, Clone)]
pub struct AuthHandler {
    config: GbpConfig,
    http_client: reqwest::Client,
}

impl AuthHandler {
    pub fn new(config: GbpConfig) -> GbpResult<Self> {
        let http_client = config.http_client()?;
        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &GbpConfig {
        &self.config
    }

    pub fn store(&self) -> TokenStore {
        TokenStore::new(&self.config.token_file)
    }

    /// Scopes requested during consent.
    pub fn scopes() -> Vec<String> {
        vec![BUSINESS_MANAGE_SCOPE.to_string()]
    }

    /// Returns a session with a usable credential.
    ///
    /// Uses the stored token when it is still valid, refreshes it when it has
    /// expired, and falls back to the interactive consent flow when there is
    /// no usable token or the refresh is rejected. New tokens are persisted
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if the credentials file is missing or
    /// malformed, or if the consent flow fails.
    pub async fn authenticate(&self) -> GbpResult<AuthSession> {
        let secrets = ClientSecrets::from_file(&self.config.credentials_file)?;
        let oauth = OAuthClient::new(secrets, &self.config)?;
        let store = self.store();

        let stored = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable token file");
            None
        });

        if let Some(credential) = stored {
            if !credential.has_scopes(&[BUSINESS_MANAGE_SCOPE]) {
                info!("stored token lacks the business.manage scope, re-authorizing");
            } else if !credential.is_expired() {
                debug!("using stored token");
                return Ok(AuthSession::new(credential, store, oauth));
            } else if credential.can_refresh() {
                debug!("stored token expired, refreshing");
                let mut session = AuthSession::new(credential, store.clone(), oauth.clone());
                match session.force_refresh().await {
                    Ok(()) => return Ok(session),
                    Err(e) if e.is_auth() => {
                        warn!(error = %e, "token refresh rejected, starting consent flow");
                    }
                    Err(e) => return Err(e),
                }
            } else {
                info!("stored token expired and has no refresh token, re-authorizing");
            }
        }

        let credential = self.consent(&oauth, &store, PkceFlow::new()).await?;
        Ok(AuthSession::new(credential, store, oauth))
    }

    /// Runs the consent flow and persists the granted credential.
    async fn consent(
        &self,
        oauth: &OAuthClient,
        store: &TokenStore,
        pkce: PkceFlow,
    ) -> GbpResult<Credential> {
        let credential = oauth
            .authorize(pkce, &self.config.redirect_uri, &Self::scopes())
            .await?;
        store.save(&credential)?;
        info!("authentication successful");
        Ok(credential)
    }

    /// Revokes the known credential upstream and deletes the token file.
    ///
    /// `credential` takes precedence over the token file. The refresh token is
    /// revoked when present (which also invalidates its access tokens).
    /// Without any credential this is a no-op, so calling it twice is fine.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if the revocation endpoint rejects the
    /// token for a reason other than it already being invalid. The token file
    /// is kept in that case.
    pub async fn revoke_credentials(&self, credential: Option<&Credential>) -> GbpResult<()> {
        let store = self.store();
        let credential = match credential {
            Some(credential) => Some(credential.clone()),
            None => store.load().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring unreadable token file");
                None
            }),
        };

        let Some(credential) = credential else {
            debug!("no credential to revoke");
            return Ok(());
        };

        let token = credential
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or(credential.access_token);
        revoke_token(&self.http_client, &self.config.revoke_url, &token).await?;

        store.clear()?;
        info!("credentials revoked");
        Ok(())
    }
}

/// An authenticated credential bound to its store and OAuth client.
#[derive(Debug)]
pub struct AuthSession {
    credential: Credential,
    store: TokenStore,
    oauth: OAuthClient,
}

impl AuthSession {
    pub fn new(credential: Credential, store: TokenStore, oauth: OAuthClient) -> Self {
        Self {
            credential,
            store,
            oauth,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn can_refresh(&self) -> bool {
        self.credential.can_refresh()
    }

    /// Returns the access token, refreshing it first when it has expired.
    pub async fn bearer_token(&mut self) -> GbpResult<String> {
        if self.credential.is_expired() {
            if !self.can_refresh() {
                return Err(GbpError::auth(
                    "access token expired and no refresh token is available - re-authenticate",
                ));
            }
            debug!("access token expired, refreshing");
            self.force_refresh().await?;
        }
        Ok(self.credential.access_token.clone())
    }

    /// Refreshes the access token unconditionally and persists the result.
    pub async fn force_refresh(&mut self) -> GbpResult<()> {
        let refresh_token = self
            .credential
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GbpError::auth("no refresh token - re-authentication required"))?;

        let response = self.oauth.refresh_token(&refresh_token).await?;
        self.credential
            .apply_refresh(response.access_token, response.expires_in, response.refresh_token);
        self.store.save(&self.credential)?;
        Ok(())
    }
}
