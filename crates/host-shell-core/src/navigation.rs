//! Keeps the selected application, the sidebar and the browser location
//! consistent.
//!
//! Location changes are two-phase: `observe_location` only records the
//! newest path in a single pending slot; `apply_pending` (run once per
//! scheduling turn) resolves it and updates the selection. User selection
//! goes the other way and yields a history *replace*.

use serde::Serialize;
use tracing::debug;

use crate::config::HostConfig;
use crate::registry::{Application, ApplicationId, SortOrder};
use crate::resolver::{Resolution, RouteResolver};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub selected_application_id: Option<ApplicationId>,
    pub sidebar_expanded: bool,
    pub sort_order: SortOrder,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            selected_application_id: None,
            sidebar_expanded: true,
            sort_order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryUpdate {
    Replace(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(ApplicationId),
    Cleared,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationSyncEngine {
    state: NavigationState,
    selected: Option<Application>,
    pending_path: Option<String>,
    apply_scheduled: bool,
}

impl NavigationSyncEngine {
    #[must_use]
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            state: NavigationState {
                sort_order,
                ..NavigationState::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Application> {
        self.selected.as_ref()
    }

    /// Sidebar or card click.
    pub fn select_application(
        &mut self,
        application: &Application,
        config: &HostConfig,
    ) -> HistoryUpdate {
        self.set_selected(Some(application.clone()));
        HistoryUpdate::Replace(application.target_path(config))
    }

    pub fn go_home(&mut self, config: &HostConfig) -> HistoryUpdate {
        self.set_selected(None);
        HistoryUpdate::Replace(config.root_path.clone())
    }

    /// Records an external location change. Returns `true` when the caller
    /// must schedule an `apply_pending` for the next turn; further
    /// observations before then only replace the pending path.
    pub fn observe_location(&mut self, path: &str) -> bool {
        self.pending_path = Some(path.to_string());
        if self.apply_scheduled {
            return false;
        }
        self.apply_scheduled = true;
        true
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending_path.is_some()
    }

    /// Resolves the pending path. Without an application list for the
    /// active session the path stays pending and the selection is left
    /// alone.
    pub fn apply_pending(
        &mut self,
        applications: Option<&[Application]>,
        resolver: &RouteResolver<'_>,
    ) -> Option<SelectionChange> {
        self.apply_scheduled = false;
        let applications = applications?;
        let path = self.pending_path.take()?;

        let resolution = resolver.classify(&path, applications, self.selected.as_ref());
        debug!(path = %path, resolution = ?resolution_label(&resolution), "location reconciled");
        // a kept selection is swapped for its record in the current list
        let next = resolution
            .application()
            .map(|app| applications.iter().find(|fresh| fresh.id == app.id).unwrap_or(app))
            .cloned();

        let previous = self.selected.take();
        let change = match (&previous, &next) {
            (None, None) => None,
            (Some(previous), Some(next)) if previous.embeds_like(next) => None,
            (_, Some(next)) => Some(SelectionChange::Selected(next.id)),
            (Some(_), None) => Some(SelectionChange::Cleared),
        };
        self.set_selected(next);
        change
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.state.sidebar_expanded = !self.state.sidebar_expanded;
        self.state.sidebar_expanded
    }

    /// Returns `true` when the order actually changed.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> bool {
        if self.state.sort_order == sort_order {
            return false;
        }
        self.state.sort_order = sort_order;
        true
    }

    pub fn reset(&mut self) {
        self.set_selected(None);
        self.pending_path = None;
        self.apply_scheduled = false;
    }

    fn set_selected(&mut self, application: Option<Application>) {
        self.state.selected_application_id = application.as_ref().map(|app| app.id);
        self.selected = application;
    }
}

fn resolution_label(resolution: &Resolution<'_>) -> &'static str {
    match resolution {
        Resolution::Home => "home",
        Resolution::Matched { strategy, .. } => strategy.as_str(),
        Resolution::Kept(_) => "kept",
        Resolution::Miss => "miss",
    }
}
