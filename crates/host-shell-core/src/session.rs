use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::{Url, form_urlencoded};

use crate::config::HostConfig;
use crate::error::{HostApiError, TokenStoreError, UNKNOWN_AUTH_ERROR_MESSAGE};

pub const TOKEN_STORAGE_KEY: &str = "authToken";
pub const TOKEN_QUERY_PARAM: &str = "token";
pub const CURRENT_USER_PATH: &str = "/user/me";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    #[serde(
        default,
        rename = "rol",
        alias = "role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Outcome of the login handshake. `Redirecting` is terminal: the page is
/// being abandoned and nothing downstream should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResult {
    Checking,
    Authenticated(Session),
    Redirecting { login_url: String },
    Failed { reason: String },
}

impl SessionResult {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Checking | Self::Redirecting { .. } | Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Authenticated(_) => "authenticated",
            Self::Redirecting { .. } => "redirecting",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Durable storage for the bearer token (plain text under a fixed key).
pub trait TokenStore {
    fn load_token(&self) -> Result<Option<String>, TokenStoreError>;
    fn save_token(&self, token: &str) -> Result<(), TokenStoreError>;
    fn clear_token(&self) -> Result<(), TokenStoreError>;
}

/// The browser address bar as the handshake sees it.
pub trait BrowserLocation {
    fn href(&self) -> String;
    /// Rewrites the visible URL without adding a history entry.
    fn replace_url(&self, url: &str);
    /// Full-page navigation away from the shell.
    fn navigate_away(&self, url: &str);
}

#[async_trait(?Send)]
pub trait IdentityTransport {
    async fn fetch_current_user(&self, token: &str) -> Result<UserProfile, HostApiError>;
}

/// Splits a non-empty `token` query parameter out of `href`, returning the
/// token and the URL without it. Other query segments are kept byte for
/// byte.
#[must_use]
pub fn split_token_from_url(href: &str) -> Option<(String, String)> {
    let mut url = Url::parse(href).ok()?;
    let token = url
        .query_pairs()
        .find(|(key, _)| key == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())?;

    let retained = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty() && !is_token_segment(segment))
        .collect::<Vec<_>>()
        .join("&");
    url.set_query((!retained.is_empty()).then_some(retained.as_str()));
    Some((token, url.to_string()))
}

fn is_token_segment(segment: &str) -> bool {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(key, _)| key == TOKEN_QUERY_PARAM)
}

/// Moves a token handed back by the identity service from the URL into
/// durable storage and strips it from the visible address. Calling this
/// again after the rewrite is a no-op.
pub fn extract_token_from_url<S, L>(store: &S, location: &L) -> Option<String>
where
    S: TokenStore + ?Sized,
    L: BrowserLocation + ?Sized,
{
    let (token, cleaned_url) = split_token_from_url(&location.href())?;
    debug!("session token found in return url");
    if let Err(error) = store.save_token(&token) {
        warn!(%error, "failed to persist session token; using it for this page only");
    }
    location.replace_url(&cleaned_url);
    Some(token)
}

#[must_use]
pub fn current_user_url(base_url: &str) -> String {
    format!("{base_url}{CURRENT_USER_PATH}")
}

#[must_use]
pub fn build_login_url(config: &HostConfig, return_to: &str) -> String {
    let from_url: String = form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
    let separator = if config.your_id_login_url.contains('?') {
        '&'
    } else {
        '?'
    };
    format!(
        "{}{separator}env={}&from_url={from_url}",
        config.your_id_login_url,
        config.env.as_str()
    )
}

pub struct SessionAuthenticator<'a, S: ?Sized, L: ?Sized, T: ?Sized> {
    config: &'a HostConfig,
    store: &'a S,
    location: &'a L,
    transport: &'a T,
}

impl<'a, S, L, T> SessionAuthenticator<'a, S, L, T>
where
    S: TokenStore + ?Sized,
    L: BrowserLocation + ?Sized,
    T: IdentityTransport + ?Sized,
{
    pub fn new(config: &'a HostConfig, store: &'a S, location: &'a L, transport: &'a T) -> Self {
        Self {
            config,
            store,
            location,
            transport,
        }
    }

    pub async fn authenticate(&self) -> SessionResult {
        let extracted = extract_token_from_url(self.store, self.location);
        let token = match extracted {
            Some(token) => token,
            None => match self.store.load_token() {
                Ok(Some(token)) if !token.trim().is_empty() => token,
                Ok(_) => {
                    info!("no session token; redirecting to identity service");
                    return self.redirect_to_login();
                }
                Err(error) => {
                    warn!(%error, "session token storage unavailable");
                    return SessionResult::Failed {
                        reason: error.to_string(),
                    };
                }
            },
        };

        match self.transport.fetch_current_user(&token).await {
            Ok(user) => {
                info!(username = %user.username, "session confirmed");
                SessionResult::Authenticated(Session { token, user })
            }
            Err(error) if error.is_unauthorized() => {
                info!("session token rejected; clearing and redirecting to identity service");
                if let Err(error) = self.store.clear_token() {
                    warn!(%error, "failed to clear rejected session token");
                }
                self.redirect_to_login()
            }
            Err(error) => {
                warn!(error = %error.describe(), "session confirmation failed");
                let reason = if error.message.trim().is_empty() {
                    UNKNOWN_AUTH_ERROR_MESSAGE.to_string()
                } else {
                    error.message
                };
                SessionResult::Failed { reason }
            }
        }
    }

    fn redirect_to_login(&self) -> SessionResult {
        let login_url = build_login_url(self.config, &self.location.href());
        self.location.navigate_away(&login_url);
        SessionResult::Redirecting { login_url }
    }
}
