use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::HostConfig;
use crate::error::HostApiError;
use crate::session::{Session, SessionResult};

pub type ApplicationId = i64;

/// A registered sub-application as served by the registry backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(default, deserialize_with = "deserialize_url")]
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn deserialize_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|url| url.trim().to_string()).unwrap_or_default())
}

impl Application {
    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Where the browser goes when this application is selected.
    #[must_use]
    pub fn target_path(&self, config: &HostConfig) -> String {
        if self.has_url() {
            self.url.clone()
        } else {
            config.legacy_app_path(self.id)
        }
    }

    #[must_use]
    pub fn initials(&self) -> String {
        app_initials(&self.app_name)
    }

    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.is_active { "Active" } else { "Inactive" }
    }

    /// `false` when a refreshed record would mount differently: activation,
    /// url or the name shown in placeholders and frame titles changed.
    #[must_use]
    pub fn embeds_like(&self, other: &Self) -> bool {
        self.id == other.id
            && self.is_active == other.is_active
            && self.url == other.url
            && self.app_name == other.app_name
    }

    /// `true` when `path` is this application's url or nested below it.
    #[must_use]
    pub fn owns_path(&self, path: &str) -> bool {
        self.has_url()
            && (path == self.url
                || path
                    .strip_prefix(self.url.as_str())
                    .is_some_and(|rest| rest.starts_with('/')))
    }
}

#[must_use]
pub fn app_initials(app_name: &str) -> String {
    app_name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[must_use]
pub fn applications_count_label(count: usize) -> String {
    if count == 1 {
        "1 application".to_string()
    } else {
        format!("{count} applications")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortOrder {
    pub const ALL: [Self; 3] = [Self::Id, Self::Name, Self::CreatedAt];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::CreatedAt => "createdAt",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "ID (default)",
            Self::Name => "Name",
            Self::CreatedAt => "Creation date",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            other => Err(format!("unknown sort order `{other}`")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
pub fn applications_url(base_url: &str, sort_order: SortOrder) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("sortBy", sort_order.as_str())
        .finish();
    format!("{base_url}/applications?{query}")
}

#[async_trait(?Send)]
pub trait RegistryTransport {
    async fn fetch_applications(
        &self,
        token: &str,
        sort_order: SortOrder,
    ) -> Result<Vec<Application>, HostApiError>;
}

/// Fetches the application list for an established session. Errors are
/// surfaced untouched; degrading the view is the caller's job.
pub async fn fetch_applications<T: RegistryTransport + ?Sized>(
    transport: &T,
    session: &Session,
    sort_order: SortOrder,
) -> Result<Vec<Application>, HostApiError> {
    debug!(sort_order = %sort_order, "fetching applications");
    let applications = transport
        .fetch_applications(&session.token, sort_order)
        .await?;
    info!(count = applications.len(), sort_order = %sort_order, "applications received");
    Ok(applications)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestTicket(u64);

/// A registry fetch the caller is allowed to perform. Only
/// [`RegistryClient::begin`] hands these out, and only for an
/// authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRequest {
    pub ticket: RequestTicket,
    pub session: Session,
    pub sort_order: SortOrder,
}

impl RegistryRequest {
    pub async fn execute<T: RegistryTransport + ?Sized>(
        &self,
        transport: &T,
    ) -> Result<Vec<Application>, HostApiError> {
        fetch_applications(transport, &self.session, self.sort_order).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    Accepted,
    Stale,
}

/// Per-session cache of the application list with request-recency
/// ordering: only the most recently issued request may land.
#[derive(Debug, Clone, Default)]
pub struct RegistryClient {
    next_ticket: u64,
    latest_ticket: Option<RequestTicket>,
    session_token: Option<String>,
    sort_order: SortOrder,
    applications: Option<Vec<Application>>,
    last_error: Option<String>,
}

impl RegistryClient {
    #[must_use]
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            sort_order,
            ..Self::default()
        }
    }

    /// Issues a fetch for the current session, or `None` when there is no
    /// confirmed session to fetch with.
    pub fn begin(&mut self, session: &SessionResult, sort_order: SortOrder) -> Option<RegistryRequest> {
        let SessionResult::Authenticated(session) = session else {
            debug!("registry fetch skipped: no authenticated session");
            return None;
        };

        if self.session_token.as_deref() != Some(session.token.as_str()) {
            self.applications = None;
            self.session_token = Some(session.token.clone());
        }
        self.sort_order = sort_order;
        self.last_error = None;

        self.next_ticket = self.next_ticket.saturating_add(1);
        let ticket = RequestTicket(self.next_ticket);
        self.latest_ticket = Some(ticket);
        Some(RegistryRequest {
            ticket,
            session: session.clone(),
            sort_order,
        })
    }

    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Application>, HostApiError>,
    ) -> FetchOutcome {
        if self.latest_ticket != Some(ticket) {
            warn!(?ticket, latest = ?self.latest_ticket, "discarding superseded registry response");
            return FetchOutcome::Stale;
        }
        self.latest_ticket = None;
        match result {
            Ok(applications) => {
                self.applications = Some(applications);
                self.last_error = None;
            }
            Err(error) => {
                warn!(error = %error.describe(), "registry fetch failed");
                self.applications = None;
                self.last_error = Some(error.message);
            }
        }
        FetchOutcome::Accepted
    }

    /// Drops everything tied to the previous session.
    pub fn reset(&mut self) {
        self.latest_ticket = None;
        self.session_token = None;
        self.applications = None;
        self.last_error = None;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.latest_ticket.is_some()
    }

    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// The list fetched for the active session, if any has landed yet.
    #[must_use]
    pub fn applications(&self) -> Option<&[Application]> {
        self.applications.as_deref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn find(&self, id: ApplicationId) -> Option<&Application> {
        self.applications()?.iter().find(|app| app.id == id)
    }
}
