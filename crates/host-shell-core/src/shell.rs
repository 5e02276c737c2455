use serde::Serialize;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::error::{HostApiError, RemoteLoadError, ShellError};
use crate::loader::{BasenameSlot, MountId, PendingLoad, RemoteBoundary, ViewResult};
use crate::navigation::{HistoryUpdate, NavigationState, NavigationSyncEngine, SelectionChange};
use crate::registry::{
    Application, ApplicationId, FetchOutcome, RegistryClient, RegistryRequest, RequestTicket,
    SortOrder,
};
use crate::resolver::RouteResolver;
use crate::session::{SessionResult, UserProfile};

/// What the top-level view should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellView<'a> {
    Redirecting,
    Checking,
    AuthError(&'a str),
    SignInPrompt,
    LoadingApplications,
    FetchError(&'a str),
    Home {
        applications: &'a [Application],
    },
    Viewer {
        application: &'a Application,
        view: &'a ViewResult,
    },
}

/// Effects the browser layer performs after a shell transition.
#[derive(Debug, Default)]
#[must_use]
pub struct ShellEffects {
    pub history: Option<HistoryUpdate>,
    pub fetch: Option<RegistryRequest>,
    pub load: Option<PendingLoad>,
    pub schedule_apply: bool,
}

impl ShellEffects {
    fn merge(mut self, other: Self) -> Self {
        self.history = other.history.or(self.history);
        self.fetch = other.fetch.or(self.fetch);
        self.load = other.load.or(self.load);
        self.schedule_apply |= other.schedule_apply;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShellSnapshot {
    pub session_status: &'static str,
    pub user: Option<UserProfile>,
    pub navigation: NavigationState,
    pub applications_loaded: Option<usize>,
    pub applications_loading: bool,
    pub current_path: String,
    pub basename: Option<String>,
    pub view: Option<ViewResult>,
    pub last_error: Option<String>,
}

/// The orchestration state of the host: session, registry cache,
/// navigation and the mounted application. All transitions are
/// synchronous; async work is returned as [`ShellEffects`] for the caller
/// to run and feed back.
pub struct HostShell {
    config: HostConfig,
    session: SessionResult,
    registry: RegistryClient,
    navigation: NavigationSyncEngine,
    boundary: Option<RemoteBoundary>,
    slot: BasenameSlot,
    next_mount: u64,
    current_path: String,
}

impl HostShell {
    pub fn new(config: HostConfig, slot: BasenameSlot, current_path: &str) -> Self {
        let sort_order = SortOrder::default();
        Self {
            config,
            session: SessionResult::Checking,
            registry: RegistryClient::new(sort_order),
            navigation: NavigationSyncEngine::new(sort_order),
            boundary: None,
            slot,
            next_mount: 0,
            current_path: current_path.to_string(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionResult {
        &self.session
    }

    #[must_use]
    pub fn navigation(&self) -> &NavigationState {
        self.navigation.state()
    }

    #[must_use]
    pub fn applications(&self) -> Option<&[Application]> {
        self.registry.applications()
    }

    #[must_use]
    pub fn is_loading_applications(&self) -> bool {
        self.registry.is_loading()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Application> {
        self.navigation.selected()
    }

    #[must_use]
    pub fn boundary(&self) -> Option<&RemoteBoundary> {
        self.boundary.as_ref()
    }

    /// Installs the handshake outcome. An authenticated session kicks off
    /// the first registry fetch; anything else drops session-bound state.
    pub fn set_session(&mut self, session: SessionResult) -> ShellEffects {
        info!(status = session.status(), "session state changed");
        self.session = session;
        if self.session.session().is_none() {
            self.registry.reset();
            self.navigation.reset();
            self.unmount();
            return ShellEffects::default();
        }
        ShellEffects {
            fetch: self.registry.begin(&self.session, self.navigation.state().sort_order),
            schedule_apply: self.navigation.observe_location(&self.current_path),
            ..ShellEffects::default()
        }
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> ShellEffects {
        if !self.navigation.set_sort_order(sort_order) {
            return ShellEffects::default();
        }
        ShellEffects {
            fetch: self.registry.begin(&self.session, sort_order),
            ..ShellEffects::default()
        }
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.navigation.toggle_sidebar()
    }

    /// Lands a registry response. Stale responses change nothing. A fresh
    /// list re-reconciles the current location against it.
    pub fn complete_fetch(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Application>, HostApiError>,
    ) -> ShellEffects {
        if self.registry.complete(ticket, result) == FetchOutcome::Stale {
            return ShellEffects::default();
        }
        if self.registry.applications().is_none() {
            return ShellEffects::default();
        }
        ShellEffects {
            schedule_apply: self.navigation.observe_location(&self.current_path),
            ..ShellEffects::default()
        }
    }

    /// Back/forward or a direct link changed the address bar.
    pub fn location_changed(&mut self, path: &str) -> ShellEffects {
        self.current_path = path.to_string();
        ShellEffects {
            schedule_apply: self.navigation.observe_location(path),
            ..ShellEffects::default()
        }
    }

    /// Second phase of a location change, run on the next turn.
    pub fn apply_pending_navigation(&mut self) -> ShellEffects {
        let resolver = RouteResolver::new(&self.config.root_path, &self.config.remotes);
        let change = self
            .navigation
            .apply_pending(self.registry.applications(), &resolver);
        match change {
            Some(SelectionChange::Selected(_)) => ShellEffects {
                load: self.remount(),
                ..ShellEffects::default()
            },
            Some(SelectionChange::Cleared) => {
                self.unmount();
                ShellEffects::default()
            }
            None => ShellEffects::default(),
        }
    }

    pub fn select(&mut self, id: ApplicationId) -> ShellEffects {
        let Some(application) = self.registry.find(id).cloned() else {
            debug!(id, "ignoring selection of unknown application");
            return ShellEffects::default();
        };
        let unchanged = self
            .navigation
            .selected()
            .is_some_and(|current| current.embeds_like(&application));
        let HistoryUpdate::Replace(path) =
            self.navigation.select_application(&application, &self.config);
        self.current_path.clone_from(&path);
        let effects = ShellEffects {
            history: Some(HistoryUpdate::Replace(path)),
            ..ShellEffects::default()
        };
        let failed = self
            .boundary
            .as_ref()
            .is_some_and(|boundary| matches!(boundary.view(), ViewResult::Failed { .. }));
        // reselecting a failed application is the retry path
        if unchanged && self.boundary.is_some() && !failed {
            return effects;
        }
        effects.merge(ShellEffects {
            load: self.remount(),
            ..ShellEffects::default()
        })
    }

    pub fn go_home(&mut self) -> ShellEffects {
        let update = self.navigation.go_home(&self.config);
        let HistoryUpdate::Replace(path) = &update;
        self.current_path.clone_from(path);
        self.unmount();
        ShellEffects {
            history: Some(update),
            ..ShellEffects::default()
        }
    }

    /// Feeds back the result of a [`PendingLoad`]. Only the mounted
    /// boundary is touched; a result for an already replaced mount is
    /// dropped.
    pub fn finish_load(
        &mut self,
        mount_id: MountId,
        result: Result<(), RemoteLoadError>,
    ) -> Option<ShellError> {
        let boundary = self.boundary.as_mut()?;
        let failure = result.as_ref().err().map(|error| error.message.clone());
        if !boundary.finish(mount_id, result) {
            return None;
        }
        failure.map(|message| ShellError::RemoteLoadFailure {
            application_id: boundary.application_id(),
            message,
        })
    }

    #[must_use]
    pub fn view(&self) -> ShellView<'_> {
        match &self.session {
            SessionResult::Redirecting { .. } => return ShellView::Redirecting,
            SessionResult::Checking => return ShellView::Checking,
            SessionResult::Failed { reason } => return ShellView::AuthError(reason),
            SessionResult::Authenticated(_) => {}
        }

        let Some(applications) = self.registry.applications() else {
            return match self.registry.last_error() {
                Some(message) => ShellView::FetchError(message),
                None if self.registry.is_loading() => ShellView::LoadingApplications,
                None => ShellView::SignInPrompt,
            };
        };

        match (self.navigation.selected(), self.boundary.as_ref()) {
            (Some(application), Some(boundary)) if boundary.application_id() == application.id => {
                ShellView::Viewer {
                    application,
                    view: boundary.view(),
                }
            }
            _ => ShellView::Home { applications },
        }
    }

    #[must_use]
    pub fn last_error(&self) -> Option<ShellError> {
        if let SessionResult::Failed { reason } = &self.session {
            return Some(ShellError::AuthFailure(reason.clone()));
        }
        if let Some(message) = self.registry.last_error() {
            return Some(ShellError::FetchFailure(message.to_string()));
        }
        let boundary = self.boundary.as_ref()?;
        match boundary.view() {
            ViewResult::Failed { message, .. } => Some(ShellError::RemoteLoadFailure {
                application_id: boundary.application_id(),
                message: message.clone(),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ShellSnapshot {
        ShellSnapshot {
            session_status: self.session.status(),
            user: self.session.session().map(|session| session.user.clone()),
            navigation: self.navigation.state().clone(),
            applications_loaded: self.registry.applications().map(<[Application]>::len),
            applications_loading: self.registry.is_loading(),
            current_path: self.current_path.clone(),
            basename: self.slot.current(),
            view: self.boundary.as_ref().map(|boundary| boundary.view().clone()),
            last_error: self.last_error().map(|error| error.to_string()),
        }
    }

    fn remount(&mut self) -> Option<PendingLoad> {
        let application = self.navigation.selected()?.clone();
        self.next_mount = self.next_mount.saturating_add(1);
        let (boundary, pending) = RemoteBoundary::mount(
            MountId(self.next_mount),
            &application,
            &self.config.remotes,
            &self.slot,
        );
        // the old guard only clears the slot if it still owns it
        self.boundary = Some(boundary);
        pending
    }

    fn unmount(&mut self) {
        if let Some(boundary) = self.boundary.take() {
            debug!(application_id = boundary.application_id(), "unmounting application");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::HostGlobals;
    use crate::loader::tests::RecordingGlobals;
    use crate::registry::tests::app;
    use crate::session::Session;
    use crate::session::tests::config;
    use std::rc::Rc;

    fn new_shell(path: &str) -> (HostShell, Rc<RecordingGlobals>) {
        let globals = Rc::new(RecordingGlobals::default());
        let dyn_globals: Rc<dyn HostGlobals> = globals.clone();
        (
            HostShell::new(config(), BasenameSlot::new(dyn_globals), path),
            globals,
        )
    }

    fn authenticated() -> SessionResult {
        SessionResult::Authenticated(Session {
            token: "t".to_string(),
            user: UserProfile {
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                role: None,
            },
        })
    }

    #[test]
    fn no_fetch_before_session() {
        let (mut shell, _) = new_shell("/v2");
        assert_eq!(shell.view(), ShellView::Checking);
        let effects = shell.set_sort_order(SortOrder::Name);
        assert!(effects.fetch.is_none());

        let effects = shell.set_session(SessionResult::Failed {
            reason: "backend down".to_string(),
        });
        assert!(effects.fetch.is_none());
        assert_eq!(shell.view(), ShellView::AuthError("backend down"));
        assert!(matches!(shell.last_error(), Some(ShellError::AuthFailure(_))));
    }

    #[test]
    fn redirecting_renders_nothing_further() {
        let (mut shell, _) = new_shell("/v2");
        let _ = shell.set_session(SessionResult::Redirecting {
            login_url: "https://id.example.com/login".to_string(),
        });
        assert_eq!(shell.view(), ShellView::Redirecting);
    }

    #[test]
    fn deep_link_resolves_once_list_arrives() {
        let (mut shell, globals) = new_shell("/atena/stats");
        let effects = shell.set_session(authenticated());
        assert!(effects.schedule_apply);
        let request = effects.fetch.expect("fetch issued");
        assert_eq!(shell.view(), ShellView::LoadingApplications);

        // list not there yet: nothing resolves
        let _ = shell.apply_pending_navigation();
        assert!(shell.selected().is_none());

        let effects = shell.complete_fetch(request.ticket, Ok(vec![app(1, "/atena"), app(2, "/blizzard")]));
        assert!(effects.schedule_apply);
        let effects = shell.apply_pending_navigation();
        let load = effects.load.expect("remote load");
        assert_eq!(load.basename, "/atena");
        assert_eq!(globals.basename.borrow().as_deref(), Some("/atena"));

        assert!(shell.finish_load(load.mount_id, Ok(())).is_none());
        let ShellView::Viewer { application, view } = shell.view() else {
            panic!("expected viewer");
        };
        assert_eq!(application.id, 1);
        assert!(matches!(view, ViewResult::Mounted { .. }));
    }

    #[test]
    fn fetch_failure_is_visible_and_list_stays_empty() {
        let (mut shell, _) = new_shell("/v2");
        let request = shell.set_session(authenticated()).fetch.expect("fetch");
        let _ = shell.complete_fetch(request.ticket, Err(HostApiError::network("offline")));
        assert_eq!(shell.view(), ShellView::FetchError("offline"));
        assert!(shell.applications().is_none());
    }

    #[test]
    fn select_replaces_history_and_go_home_unmounts() {
        let (mut shell, globals) = new_shell("/v2");
        let request = shell.set_session(authenticated()).fetch.expect("fetch");
        let _ = shell.complete_fetch(request.ticket, Ok(vec![app(1, "/atena"), app(4, "")]));
        let _ = shell.apply_pending_navigation();

        let effects = shell.select(4);
        assert_eq!(
            effects.history,
            Some(HistoryUpdate::Replace("/v2/app/4".to_string()))
        );
        assert!(effects.load.is_none());
        assert!(matches!(
            shell.view(),
            ShellView::Viewer {
                view: ViewResult::Frame(_),
                ..
            }
        ));

        let effects = shell.select(1);
        assert!(effects.load.is_some());
        assert_eq!(globals.basename.borrow().as_deref(), Some("/atena"));

        let effects = shell.go_home();
        assert_eq!(effects.history, Some(HistoryUpdate::Replace("/v2".to_string())));
        assert!(globals.basename.borrow().is_none());
        assert!(matches!(shell.view(), ShellView::Home { .. }));
    }

    #[test]
    fn remote_failure_stays_inside_its_boundary() {
        let (mut shell, _) = new_shell("/v2");
        let request = shell.set_session(authenticated()).fetch.expect("fetch");
        let _ = shell.complete_fetch(request.ticket, Ok(vec![app(1, "/atena"), app(2, "/blizzard")]));
        let _ = shell.apply_pending_navigation();
        let sidebar_before = shell.navigation().clone();

        let load = shell.select(2).load.expect("remote load");
        let failure = shell.finish_load(
            load.mount_id,
            Err(RemoteLoadError::render("boom")),
        );
        assert_eq!(
            failure,
            Some(ShellError::RemoteLoadFailure {
                application_id: 2,
                message: "boom".to_string(),
            })
        );
        assert_eq!(shell.navigation().sidebar_expanded, sidebar_before.sidebar_expanded);
        assert_eq!(shell.applications().map(<[Application]>::len), Some(2));

        let retry = shell.select(2).load.expect("reselect retries the load");
        assert_ne!(retry.mount_id, load.mount_id);
        assert!(shell.finish_load(load.mount_id, Ok(())).is_none());
        assert!(shell.select(2).load.is_none());

        let load = shell.select(1).load.expect("remote load");
        assert!(shell.finish_load(load.mount_id, Ok(())).is_none());
        assert!(shell.last_error().is_none());
    }

    #[test]
    fn sort_change_refetches_without_clearing_selection() {
        let (mut shell, _) = new_shell("/atena");
        let request = shell.set_session(authenticated()).fetch.expect("fetch");
        let _ = shell.complete_fetch(request.ticket, Ok(vec![app(1, "/atena")]));
        let _ = shell.apply_pending_navigation();
        assert_eq!(shell.navigation().selected_application_id, Some(1));

        let request = shell.set_sort_order(SortOrder::CreatedAt).fetch.expect("refetch");
        assert_eq!(request.sort_order, SortOrder::CreatedAt);
        assert_eq!(shell.navigation().selected_application_id, Some(1));
        assert!(matches!(shell.view(), ShellView::Viewer { .. }));
    }

    #[test]
    fn refreshed_record_remounts_the_selected_application() {
        let (mut shell, globals) = new_shell("/atena");
        let request = shell.set_session(authenticated()).fetch.expect("fetch");
        let _ = shell.complete_fetch(request.ticket, Ok(vec![app(1, "/atena")]));
        let load = shell.apply_pending_navigation().load.expect("remote load");
        assert!(shell.finish_load(load.mount_id, Ok(())).is_none());

        let request = shell.set_sort_order(SortOrder::Name).fetch.expect("refetch");
        let mut deactivated = app(1, "/atena");
        deactivated.is_active = false;
        let effects = shell.complete_fetch(request.ticket, Ok(vec![deactivated]));
        assert!(effects.schedule_apply);
        assert!(shell.apply_pending_navigation().load.is_none());
        assert!(matches!(
            shell.view(),
            ShellView::Viewer {
                view: ViewResult::Unavailable { .. },
                ..
            }
        ));
        assert!(globals.basename.borrow().is_none());

        // reselecting picks up a record that changed since the last mount
        let request = shell.set_sort_order(SortOrder::Id).fetch.expect("refetch");
        let _ = shell.complete_fetch(request.ticket, Ok(vec![app(1, "/atena")]));
        let load = shell.select(1).load.expect("reactivated application loads");
        assert_eq!(load.application_id, 1);
        assert_eq!(globals.basename.borrow().as_deref(), Some("/atena"));
        assert!(shell.apply_pending_navigation().load.is_none());
    }

    #[test]
    fn snapshot_never_contains_token() {
        let (mut shell, _) = new_shell("/v2");
        let _ = shell.set_session(authenticated());
        let json = serde_json::to_string(&shell.snapshot()).expect("serialize");
        assert!(json.contains("\"session_status\":\"authenticated\""));
        assert!(!json.contains("\"token\""));
    }
}
