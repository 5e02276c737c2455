use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct BootDiagnostics {
    pub(crate) phase: String,
    pub(crate) detail: String,
    pub(crate) last_error: Option<String>,
    pub(crate) route_path: String,
    pub(crate) remote_loads_started: u64,
    pub(crate) remote_loads_failed: u64,
}
