//! Platform-independent core of the micro-frontend host shell: session
//! handshake, application registry, route resolution, remote mounting and
//! navigation sync. Browser bindings live in the web-shell app.

pub mod config;
pub mod error;
pub mod loader;
pub mod navigation;
pub mod registry;
pub mod remote;
pub mod resolver;
pub mod session;
pub mod shell;

pub use config::{ConfigError, DeployEnv, HostConfig};
pub use error::{HostApiError, HostErrorKind, LoadStage, RemoteLoadError, ShellError, TokenStoreError};
pub use loader::{
    BasenameSlot, Embedding, FrameSpec, HostGlobals, MountId, PendingLoad, RemoteBoundary,
    RemoteModuleLoader, ViewResult,
};
pub use navigation::{HistoryUpdate, NavigationState, NavigationSyncEngine, SelectionChange};
pub use registry::{
    Application, ApplicationId, FetchOutcome, RegistryClient, RegistryRequest, RegistryTransport,
    RequestTicket, SortOrder,
};
pub use remote::{ModuleLocator, RemoteMappingEntry, RemoteMappingTable};
pub use resolver::{MatchStrategy, Resolution, RouteResolver};
pub use session::{
    BrowserLocation, IdentityTransport, Session, SessionAuthenticator, SessionResult, TokenStore,
    UserProfile,
};
pub use shell::{HostShell, ShellEffects, ShellSnapshot, ShellView};
