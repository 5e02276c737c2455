//! Decides how a selected application is shown and isolates failures of
//! remotely loaded modules to the boundary that mounted them.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{LoadStage, RemoteLoadError};
use crate::registry::{Application, ApplicationId};
use crate::remote::{ModuleLocator, RemoteMappingTable};

pub const FRAME_SANDBOX: &str =
    "allow-same-origin allow-scripts allow-forms allow-popups allow-modals";
pub const DEFAULT_FRAME_TITLE: &str = "Application";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSpec {
    pub src: String,
    pub title: String,
    pub sandbox: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Embedding {
    Remote {
        locator: ModuleLocator,
        basename: String,
    },
    Frame(FrameSpec),
}

/// Embedded module when the url is mapped in the remote table, sandboxed
/// frame otherwise.
#[must_use]
pub fn plan_embedding(application: &Application, remotes: &RemoteMappingTable) -> Embedding {
    match remotes.lookup(&application.url) {
        Some(entry) => Embedding::Remote {
            locator: entry.locator.clone(),
            basename: application.url.clone(),
        },
        None => Embedding::Frame(FrameSpec {
            src: application.url.clone(),
            title: if application.app_name.trim().is_empty() {
                DEFAULT_FRAME_TITLE.to_string()
            } else {
                application.app_name.clone()
            },
            sandbox: FRAME_SANDBOX,
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewResult {
    Unavailable { app_name: String },
    Loading { locator: ModuleLocator },
    Mounted { locator: ModuleLocator, basename: String },
    Frame(FrameSpec),
    Failed { stage: LoadStage, message: String },
}

/// Publishes the active basename where independently loaded modules can
/// read it (`window.__MF_BASENAME__` / `__MF_HOST__` in the browser).
pub trait HostGlobals {
    fn publish_basename(&self, basename: &str);
    fn clear_basename(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MountId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
struct BasenameOwner {
    mount_id: MountId,
    basename: String,
}

/// The single process-wide basename value. Only boundaries write it, each
/// through the guard it holds, and a guard only clears the slot while it
/// still owns it.
#[derive(Clone)]
pub struct BasenameSlot {
    owner: Rc<RefCell<Option<BasenameOwner>>>,
    globals: Rc<dyn HostGlobals>,
}

impl BasenameSlot {
    pub fn new(globals: Rc<dyn HostGlobals>) -> Self {
        Self {
            owner: Rc::new(RefCell::new(None)),
            globals,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.owner
            .borrow()
            .as_ref()
            .map(|owner| owner.basename.clone())
    }

    fn claim(&self, mount_id: MountId, basename: &str) -> BasenameGuard {
        *self.owner.borrow_mut() = Some(BasenameOwner {
            mount_id,
            basename: basename.to_string(),
        });
        self.globals.publish_basename(basename);
        debug!(basename, ?mount_id, "basename set");
        BasenameGuard {
            slot: self.clone(),
            mount_id,
        }
    }
}

pub struct BasenameGuard {
    slot: BasenameSlot,
    mount_id: MountId,
}

impl Drop for BasenameGuard {
    fn drop(&mut self) {
        let mut owner = self.slot.owner.borrow_mut();
        if owner.as_ref().is_some_and(|owner| owner.mount_id == self.mount_id) {
            *owner = None;
            self.slot.globals.clear_basename();
            debug!(mount_id = ?self.mount_id, "basename cleared");
        }
    }
}

/// Downloads and first-renders remote modules. Both steps may fail; the
/// boundary turns either failure into a local error view.
#[async_trait(?Send)]
pub trait RemoteModuleLoader {
    type Module;

    async fn download(&self, locator: &ModuleLocator) -> Result<Self::Module, RemoteLoadError>;

    fn render_first(
        &self,
        module: &Self::Module,
        mount_id: MountId,
        basename: &str,
    ) -> Result<(), RemoteLoadError>;
}

/// Work the caller must drive after mounting a remote-backed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub mount_id: MountId,
    pub application_id: ApplicationId,
    pub locator: ModuleLocator,
    pub basename: String,
}

impl PendingLoad {
    pub async fn run<L: RemoteModuleLoader + ?Sized>(
        &self,
        loader: &L,
    ) -> Result<(), RemoteLoadError> {
        let module = loader.download(&self.locator).await?;
        loader.render_first(&module, self.mount_id, &self.basename)
    }
}

/// Per-application mount. Everything that goes wrong inside it stays in
/// its `view`.
pub struct RemoteBoundary {
    mount_id: MountId,
    application_id: ApplicationId,
    view: ViewResult,
    basename: Option<BasenameGuard>,
}

impl RemoteBoundary {
    /// Inactive applications never reach the loader. For remote modules
    /// the basename is claimed here, before any module code runs.
    pub fn mount(
        mount_id: MountId,
        application: &Application,
        remotes: &RemoteMappingTable,
        slot: &BasenameSlot,
    ) -> (Self, Option<PendingLoad>) {
        if !application.is_active {
            info!(application_id = application.id, "application inactive; not loading");
            let boundary = Self {
                mount_id,
                application_id: application.id,
                view: ViewResult::Unavailable {
                    app_name: application.app_name.clone(),
                },
                basename: None,
            };
            return (boundary, None);
        }

        match plan_embedding(application, remotes) {
            Embedding::Frame(frame) => {
                debug!(application_id = application.id, src = %frame.src, "embedding as frame");
                let boundary = Self {
                    mount_id,
                    application_id: application.id,
                    view: ViewResult::Frame(frame),
                    basename: None,
                };
                (boundary, None)
            }
            Embedding::Remote { locator, basename } => {
                let guard = slot.claim(mount_id, &basename);
                info!(application_id = application.id, %locator, "loading remote module");
                let pending = PendingLoad {
                    mount_id,
                    application_id: application.id,
                    locator: locator.clone(),
                    basename,
                };
                let boundary = Self {
                    mount_id,
                    application_id: application.id,
                    view: ViewResult::Loading { locator },
                    basename: Some(guard),
                };
                (boundary, Some(pending))
            }
        }
    }

    /// Applies the result of a [`PendingLoad`]. Results for a different
    /// mount are ignored and `false` is returned.
    pub fn finish(&mut self, mount_id: MountId, result: Result<(), RemoteLoadError>) -> bool {
        if mount_id != self.mount_id {
            debug!(?mount_id, current = ?self.mount_id, "ignoring load result for replaced mount");
            return false;
        }
        let ViewResult::Loading { locator } = &self.view else {
            return false;
        };
        let locator = locator.clone();
        self.view = match result {
            Ok(()) => ViewResult::Mounted {
                basename: self.basename_value().unwrap_or_default(),
                locator,
            },
            Err(failure) => {
                error!(
                    application_id = self.application_id,
                    %locator,
                    stage = ?failure.stage,
                    message = %failure.message,
                    "remote module failed"
                );
                ViewResult::Failed {
                    stage: failure.stage,
                    message: failure.message,
                }
            }
        };
        true
    }

    #[must_use]
    pub fn mount_id(&self) -> MountId {
        self.mount_id
    }

    #[must_use]
    pub fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    #[must_use]
    pub fn view(&self) -> &ViewResult {
        &self.view
    }

    fn basename_value(&self) -> Option<String> {
        let guard = self.basename.as_ref()?;
        guard
            .slot
            .owner
            .borrow()
            .as_ref()
            .filter(|owner| owner.mount_id == guard.mount_id)
            .map(|owner| owner.basename.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::tests::app;
    use std::cell::Cell;

    /// Mounts and, for remote modules, drives the load to completion.
    async fn render<L: RemoteModuleLoader + ?Sized>(
        mount_id: MountId,
        application: &Application,
        remotes: &RemoteMappingTable,
        slot: &BasenameSlot,
        loader: &L,
    ) -> RemoteBoundary {
        let (mut boundary, pending) = RemoteBoundary::mount(mount_id, application, remotes, slot);
        if let Some(pending) = pending {
            let result = pending.run(loader).await;
            boundary.finish(pending.mount_id, result);
        }
        boundary
    }

    #[derive(Default)]
    pub(crate) struct RecordingGlobals {
        pub(crate) basename: RefCell<Option<String>>,
        pub(crate) history: RefCell<Vec<Option<String>>>,
    }

    impl HostGlobals for RecordingGlobals {
        fn publish_basename(&self, basename: &str) {
            *self.basename.borrow_mut() = Some(basename.to_string());
            self.history.borrow_mut().push(Some(basename.to_string()));
        }

        fn clear_basename(&self) {
            *self.basename.borrow_mut() = None;
            self.history.borrow_mut().push(None);
        }
    }

    /// Records the basename visible at first render and can be told to
    /// fail at either stage.
    pub(crate) struct ScriptedLoader {
        pub(crate) globals: Rc<RecordingGlobals>,
        pub(crate) downloads: Cell<usize>,
        pub(crate) fail_download: bool,
        pub(crate) fail_render: bool,
        pub(crate) seen_basename: RefCell<Option<String>>,
    }

    impl ScriptedLoader {
        pub(crate) fn new(globals: Rc<RecordingGlobals>) -> Self {
            Self {
                globals,
                downloads: Cell::new(0),
                fail_download: false,
                fail_render: false,
                seen_basename: RefCell::new(None),
            }
        }
    }

    #[async_trait(?Send)]
    impl RemoteModuleLoader for ScriptedLoader {
        type Module = ModuleLocator;

        async fn download(&self, locator: &ModuleLocator) -> Result<ModuleLocator, RemoteLoadError> {
            self.downloads.set(self.downloads.get() + 1);
            if self.fail_download {
                return Err(RemoteLoadError::download("remoteEntry.js returned 404"));
            }
            Ok(locator.clone())
        }

        fn render_first(
            &self,
            _module: &ModuleLocator,
            _mount_id: MountId,
            _basename: &str,
        ) -> Result<(), RemoteLoadError> {
            *self.seen_basename.borrow_mut() = self.globals.basename.borrow().clone();
            if self.fail_render {
                return Err(RemoteLoadError::render("Cannot read properties of undefined"));
            }
            Ok(())
        }
    }

    fn slot_with(globals: &Rc<RecordingGlobals>) -> BasenameSlot {
        let dyn_globals: Rc<dyn HostGlobals> = globals.clone();
        BasenameSlot::new(dyn_globals)
    }

    #[test]
    fn unmapped_url_is_framed_with_fixed_sandbox() {
        let remotes = RemoteMappingTable::production_defaults();
        let mut external = app(5, "https://tools.example.com");
        external.app_name = "  ".to_string();
        assert_eq!(
            plan_embedding(&external, &remotes),
            Embedding::Frame(FrameSpec {
                src: "https://tools.example.com".to_string(),
                title: DEFAULT_FRAME_TITLE.to_string(),
                sandbox: FRAME_SANDBOX,
            })
        );
    }

    #[test]
    fn mapped_prefix_embeds_remote_module() {
        let remotes = RemoteMappingTable::production_defaults();
        let Embedding::Remote { locator, basename } =
            plan_embedding(&app(1, "/atena/v2"), &remotes)
        else {
            panic!("expected remote embedding");
        };
        assert_eq!(locator.as_str(), "remoteApp/App");
        assert_eq!(basename, "/atena/v2");
    }

    #[tokio::test]
    async fn inactive_application_never_downloads() {
        let globals = Rc::new(RecordingGlobals::default());
        let slot = slot_with(&globals);
        let loader = ScriptedLoader::new(globals.clone());
        let mut inactive = app(1, "/atena");
        inactive.is_active = false;

        let boundary = render(
            MountId(1),
            &inactive,
            &RemoteMappingTable::production_defaults(),
            &slot,
            &loader,
        )
        .await;

        assert!(matches!(boundary.view(), ViewResult::Unavailable { .. }));
        assert_eq!(loader.downloads.get(), 0);
        assert!(globals.history.borrow().is_empty());
    }

    #[tokio::test]
    async fn basename_is_published_before_first_render_and_cleared_on_unmount() {
        let globals = Rc::new(RecordingGlobals::default());
        let slot = slot_with(&globals);
        let loader = ScriptedLoader::new(globals.clone());

        let boundary = render(
            MountId(1),
            &app(1, "/atena"),
            &RemoteMappingTable::production_defaults(),
            &slot,
            &loader,
        )
        .await;

        assert_eq!(loader.seen_basename.borrow().as_deref(), Some("/atena"));
        assert_eq!(
            boundary.view(),
            &ViewResult::Mounted {
                locator: ModuleLocator::new("remoteApp/App").expect("locator"),
                basename: "/atena".to_string(),
            }
        );
        assert_eq!(slot.current().as_deref(), Some("/atena"));

        drop(boundary);
        assert_eq!(slot.current(), None);
        assert_eq!(globals.basename.borrow().as_deref(), None);
    }

    #[tokio::test]
    async fn render_failure_is_contained_and_basename_still_cleared() {
        let globals = Rc::new(RecordingGlobals::default());
        let slot = slot_with(&globals);
        let mut loader = ScriptedLoader::new(globals.clone());
        loader.fail_render = true;

        let boundary = render(
            MountId(3),
            &app(2, "/blizzard"),
            &RemoteMappingTable::production_defaults(),
            &slot,
            &loader,
        )
        .await;

        assert_eq!(
            boundary.view(),
            &ViewResult::Failed {
                stage: LoadStage::Render,
                message: "Cannot read properties of undefined".to_string(),
            }
        );
        drop(boundary);
        assert_eq!(
            globals.history.borrow().as_slice(),
            [Some("/blizzard".to_string()), None]
        );
    }

    #[tokio::test]
    async fn download_failure_is_reported_as_download_stage() {
        let globals = Rc::new(RecordingGlobals::default());
        let slot = slot_with(&globals);
        let mut loader = ScriptedLoader::new(globals.clone());
        loader.fail_download = true;

        let boundary = render(
            MountId(4),
            &app(2, "/blizzard"),
            &RemoteMappingTable::production_defaults(),
            &slot,
            &loader,
        )
        .await;

        assert!(matches!(
            boundary.view(),
            ViewResult::Failed {
                stage: LoadStage::Download,
                ..
            }
        ));
    }

    #[test]
    fn replaced_mount_does_not_clear_successor_basename() {
        let globals = Rc::new(RecordingGlobals::default());
        let slot = slot_with(&globals);
        let remotes = RemoteMappingTable::production_defaults();

        let (first, _) = RemoteBoundary::mount(MountId(1), &app(1, "/atena"), &remotes, &slot);
        let (mut second, pending) =
            RemoteBoundary::mount(MountId(2), &app(2, "/blizzard"), &remotes, &slot);
        drop(first);

        assert_eq!(slot.current().as_deref(), Some("/blizzard"));
        assert_eq!(globals.basename.borrow().as_deref(), Some("/blizzard"));

        assert!(!second.finish(MountId(1), Ok(())));
        let pending = pending.expect("remote load");
        assert!(second.finish(pending.mount_id, Ok(())));
        assert!(matches!(second.view(), ViewResult::Mounted { .. }));
    }
}
