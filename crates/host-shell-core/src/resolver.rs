//! Maps a browser path to the application that owns it.
//!
//! Strategies run in a fixed order and the first hit wins; within a
//! strategy the first application in list order wins:
//!
//! 1. host root (`/v2`, `/v2/`) resolves to the home view
//! 2. legacy id routes (`/v2/app/<id>`)
//! 3. exact url match against the normalized or raw path
//! 4. prefix match on a segment boundary (nested sub-application routes)
//! 5. remote-table fallback by shared module locator
//! 6. keep the previous selection while the path stays inside it

use serde::Serialize;

use crate::registry::{Application, ApplicationId};
use crate::remote::RemoteMappingTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    LegacyId,
    Exact,
    Prefix,
    RemoteTable,
}

impl MatchStrategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LegacyId => "legacy_id",
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::RemoteTable => "remote_table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Home,
    Matched {
        application: &'a Application,
        strategy: MatchStrategy,
    },
    Kept(&'a Application),
    Miss,
}

impl<'a> Resolution<'a> {
    #[must_use]
    pub fn application(&self) -> Option<&'a Application> {
        match *self {
            Self::Matched { application, .. } | Self::Kept(application) => Some(application),
            Self::Home | Self::Miss => None,
        }
    }

    #[must_use]
    pub fn application_id(&self) -> Option<ApplicationId> {
        self.application().map(|app| app.id)
    }
}

/// Strips one trailing slash and anything from a `/*` wildcard onwards.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    trimmed
        .split_once("/*")
        .map_or(trimmed, |(head, _)| head)
}

#[derive(Debug, Clone, Copy)]
pub struct RouteResolver<'c> {
    root_path: &'c str,
    remotes: &'c RemoteMappingTable,
}

impl<'c> RouteResolver<'c> {
    #[must_use]
    pub fn new(root_path: &'c str, remotes: &'c RemoteMappingTable) -> Self {
        Self { root_path, remotes }
    }

    /// Pure: the same inputs always give the same answer.
    #[must_use]
    pub fn resolve<'a>(
        &self,
        current_path: &str,
        applications: &'a [Application],
        previously_selected: Option<&'a Application>,
    ) -> Option<&'a Application> {
        self.classify(current_path, applications, previously_selected)
            .application()
    }

    #[must_use]
    pub fn classify<'a>(
        &self,
        current_path: &str,
        applications: &'a [Application],
        previously_selected: Option<&'a Application>,
    ) -> Resolution<'a> {
        if self.is_root(current_path) {
            return Resolution::Home;
        }

        if let Some(identifier) = self.legacy_identifier(current_path) {
            return applications
                .iter()
                .find(|app| id_matches(app.id, identifier))
                .map_or(Resolution::Miss, |application| Resolution::Matched {
                    application,
                    strategy: MatchStrategy::LegacyId,
                });
        }

        let normalized = normalize_path(current_path);
        let routable = || applications.iter().filter(|app| app.has_url());

        if let Some(application) =
            routable().find(|app| app.url == normalized || app.url == current_path)
        {
            return Resolution::Matched {
                application,
                strategy: MatchStrategy::Exact,
            };
        }

        if let Some(application) =
            routable().find(|app| app.owns_path(current_path) || app.owns_path(normalized))
        {
            return Resolution::Matched {
                application,
                strategy: MatchStrategy::Prefix,
            };
        }

        let mapped = self
            .remotes
            .get_exact(normalized)
            .or_else(|| self.remotes.get_exact(current_path));
        if let Some(locator) = mapped {
            if let Some(application) =
                routable().find(|app| self.remotes.get_exact(&app.url) == Some(locator))
            {
                return Resolution::Matched {
                    application,
                    strategy: MatchStrategy::RemoteTable,
                };
            }
        }

        match previously_selected {
            Some(previous)
                if !self.is_within_root(current_path)
                    && (previous.owns_path(current_path) || previous.owns_path(normalized)) =>
            {
                Resolution::Kept(previous)
            }
            _ => Resolution::Miss,
        }
    }

    fn is_root(&self, path: &str) -> bool {
        path == self.root_path || path.strip_suffix('/') == Some(self.root_path)
    }

    fn is_within_root(&self, path: &str) -> bool {
        self.is_root(path)
            || path
                .strip_prefix(self.root_path)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// `<root>/app/<id>` or `<root>/app/<id>/...`.
    fn legacy_identifier<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.root_path)?.strip_prefix("/app/")?;
        Some(rest.split('/').next().unwrap_or_default())
    }
}

fn id_matches(id: ApplicationId, identifier: &str) -> bool {
    identifier == id.to_string() || identifier.parse::<ApplicationId>().is_ok_and(|parsed| parsed == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::app;

    fn resolver(remotes: &RemoteMappingTable) -> RouteResolver<'_> {
        RouteResolver::new("/v2", remotes)
    }

    fn catalog() -> Vec<Application> {
        vec![
            app(1, "/atena"),
            app(2, "/blizzard"),
            app(3, "/blizzard-admin"),
            app(4, ""),
            app(5, "https://external.example.com/tool"),
        ]
    }

    #[test]
    fn root_resolves_home_regardless_of_list() {
        let remotes = RemoteMappingTable::production_defaults();
        let apps = catalog();
        let previous = apps.first();
        for path in ["/v2", "/v2/"] {
            assert_eq!(
                resolver(&remotes).classify(path, &apps, previous),
                Resolution::Home
            );
            assert_eq!(resolver(&remotes).resolve(path, &[], None), None);
        }
    }

    #[test]
    fn legacy_id_route_matches_numeric_forms() {
        let remotes = RemoteMappingTable::production_defaults();
        let apps = catalog();
        for path in ["/v2/app/4", "/v2/app/004", "/v2/app/4/details"] {
            let resolution = resolver(&remotes).classify(path, &apps, None);
            assert_eq!(resolution.application_id(), Some(4), "path {path}");
            assert!(matches!(
                resolution,
                Resolution::Matched {
                    strategy: MatchStrategy::LegacyId,
                    ..
                }
            ));
        }
        assert_eq!(
            resolver(&remotes).classify("/v2/app/99", &apps, None),
            Resolution::Miss
        );
        assert_eq!(
            resolver(&remotes).classify("/v2/app/", &apps, None),
            Resolution::Miss
        );
    }

    #[test]
    fn exact_match_ignores_trailing_slash_and_wildcard() {
        let remotes = RemoteMappingTable::production_defaults();
        let apps = catalog();
        for path in ["/blizzard", "/blizzard/", "/blizzard/*"] {
            let resolution = resolver(&remotes).classify(path, &apps, None);
            assert_eq!(resolution.application_id(), Some(2), "path {path}");
            assert!(matches!(
                resolution,
                Resolution::Matched {
                    strategy: MatchStrategy::Exact,
                    ..
                }
            ));
        }
    }

    #[test]
    fn exact_match_beats_shorter_prefix_sibling() {
        let remotes = RemoteMappingTable::production_defaults();
        let apps = catalog();
        assert_eq!(
            resolver(&remotes).resolve("/blizzard-admin", &apps, None).map(|a| a.id),
            Some(3)
        );
        assert_eq!(
            resolver(&remotes)
                .resolve("/blizzard-admin/users", &apps, None)
                .map(|a| a.id),
            Some(3)
        );
    }

    #[test]
    fn nested_path_resolves_by_prefix() {
        let remotes = RemoteMappingTable::production_defaults();
        let apps = vec![app(1, "/atena"), app(2, "/blizzard")];
        let resolution = resolver(&remotes).classify("/atena/stats", &apps, None);
        assert_eq!(resolution.application_id(), Some(1));
        assert!(matches!(
            resolution,
            Resolution::Matched {
                strategy: MatchStrategy::Prefix,
                ..
            }
        ));
    }

    #[test]
    fn absolute_url_applications_match_only_exactly() {
        let remotes = RemoteMappingTable::production_defaults();
        let apps = catalog();
        assert_eq!(
            resolver(&remotes)
                .resolve("https://external.example.com/tool", &apps, None)
                .map(|a| a.id),
            Some(5)
        );
    }

    #[test]
    fn remote_table_fallback_finds_application_sharing_locator() {
        let remotes = RemoteMappingTable::parse(
            "/reports=remoteApp/App,/atena=remoteApp/App,/blizzard=remoteReactStreamlit/routes",
        )
        .expect("table");
        let apps = vec![app(7, "/blizzard"), app(8, "/atena"), app(9, "/atena-copy")];
        let resolution = resolver(&remotes).classify("/reports", &apps, None);
        assert_eq!(resolution.application_id(), Some(8));
        assert!(matches!(
            resolution,
            Resolution::Matched {
                strategy: MatchStrategy::RemoteTable,
                ..
            }
        ));
    }

    #[test]
    fn shared_locator_picks_first_application_in_list_order() {
        let remotes =
            RemoteMappingTable::parse("/entry=remoteApp/App,/one=remoteApp/App,/two=remoteApp/App")
                .expect("table");
        let apps = vec![app(20, "/two"), app(10, "/one")];
        assert_eq!(
            resolver(&remotes).resolve("/entry", &apps, None).map(|a| a.id),
            Some(20)
        );
    }

    #[test]
    fn previous_selection_is_kept_for_nested_continuations() {
        let remotes = RemoteMappingTable::production_defaults();
        let previous = app(1, "/atena");
        let refreshed = vec![app(2, "/blizzard")];
        let resolution =
            resolver(&remotes).classify("/atena/settings/123", &refreshed, Some(&previous));
        assert_eq!(resolution, Resolution::Kept(&previous));
    }

    #[test]
    fn previous_selection_is_dropped_outside_its_url() {
        let remotes = RemoteMappingTable::production_defaults();
        let previous = app(1, "/atena");
        let apps = vec![app(2, "/blizzard")];
        assert_eq!(
            resolver(&remotes).classify("/elsewhere", &apps, Some(&previous)),
            Resolution::Miss
        );
        assert_eq!(
            resolver(&remotes).classify("/atenas", &apps, Some(&previous)),
            Resolution::Miss
        );
        assert_eq!(
            resolver(&remotes).classify("/v2/unknown", &apps, Some(&previous)),
            Resolution::Miss
        );
    }

    #[test]
    fn inactive_applications_still_resolve() {
        let remotes = RemoteMappingTable::production_defaults();
        let mut inactive = app(1, "/atena");
        inactive.is_active = false;
        let apps = vec![inactive];
        assert_eq!(
            resolver(&remotes).resolve("/atena", &apps, None).map(|a| a.id),
            Some(1)
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let remotes = RemoteMappingTable::production_defaults();
        let apps = catalog();
        let previous = apps.get(1);
        for path in ["/atena/x", "/v2", "/nope", "/v2/app/3", "/blizzard/*"] {
            let first = resolver(&remotes).classify(path, &apps, previous);
            let second = resolver(&remotes).classify(path, &apps, previous);
            assert_eq!(first, second, "path {path}");
        }
    }

    #[test]
    fn normalize_path_strips_slash_and_wildcard() {
        assert_eq!(normalize_path("/atena/"), "/atena");
        assert_eq!(normalize_path("/atena/*"), "/atena");
        assert_eq!(normalize_path("/atena/*/deep"), "/atena");
        assert_eq!(normalize_path("/atena"), "/atena");
    }
}
