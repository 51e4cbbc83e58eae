//! OAuth 2.0 authentication for the Business Profile APIs.
//!
//! This module provides:
//! - Client secret loading from Google's credentials JSON
//! - Token persistence with atomic writes
//! - The PKCE consent flow over a loopback redirect
//! - Lazy refresh and revocation

mod credentials;
mod handler;
mod oauth;
mod tokens;

pub use credentials::{ClientSecrets, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL};
pub use handler::{AuthHandler, AuthSession};
pub use oauth::{CallbackParams, OAuthClient, PkceFlow, RedirectTarget, TokenResponse};
pub use tokens::{BUSINESS_MANAGE_SCOPE, Credential, TokenStore};
