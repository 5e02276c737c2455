pub(crate) const RUNTIME_ENV_GLOBAL: &str = "_env_";
pub(crate) const REMOTE_ENTRIES_GLOBAL: &str = "__HOST_REMOTE_ENTRIES__";
pub(crate) const MF_BASENAME_GLOBAL: &str = "__MF_BASENAME__";
pub(crate) const MF_HOST_GLOBAL: &str = "__MF_HOST__";
pub(crate) const LOG_LEVEL_KEY: &str = "HOST_LOG_LEVEL";
pub(crate) const DEFAULT_LOG_DIRECTIVE: &str = "info";

pub(crate) const STATUS_ID: &str = "host-shell-status";
pub(crate) const ROOT_ID: &str = "host-shell-root";
pub(crate) const HEADER_ID: &str = "host-shell-header";
pub(crate) const HEADER_USER_ID: &str = "host-shell-header-user";
pub(crate) const SIDEBAR_ID: &str = "host-shell-sidebar";
pub(crate) const SIDEBAR_TOGGLE_ID: &str = "host-shell-sidebar-toggle";
pub(crate) const SORT_SELECT_ID: &str = "host-shell-sort";
pub(crate) const CONTENT_ID: &str = "host-shell-content";
pub(crate) const REMOTE_MOUNT_ID_PREFIX: &str = "host-shell-remote-mount-";
pub(crate) const REMOTE_MOUNT_ATTRIBUTE: &str = "data-remote-mount";
pub(crate) const LOADING_OVERLAY_ID: &str = "host-shell-remote-loading";

/// `data-*` attribute carrying the application id on clickable items.
pub(crate) const APPLICATION_ID_ATTRIBUTE: &str = "data-application-id";
pub(crate) const HOME_ACTION_ATTRIBUTE: &str = "data-host-home";

pub(crate) const SIDEBAR_EXPANDED_WIDTH: &str = "264px";
pub(crate) const SIDEBAR_COLLAPSED_WIDTH: &str = "64px";

/// Federation containers used when `__HOST_REMOTE_ENTRIES__` is not injected.
pub(crate) const DEFAULT_REMOTE_ENTRIES: &[(&str, &str)] = &[
    ("remoteApp", "https://remote-atena.vercel.app/assets/remoteEntry.js"),
    (
        "remoteReactStreamlit",
        "https://boogie-blizzard.vercel.app/assets/remoteEntry.js",
    ),
    (
        "remoteInformation",
        "https://blizzard-admin.vercel.app/assets/remoteEntry.js",
    ),
];
