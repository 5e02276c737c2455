pub mod console_level;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;
#[cfg(target_arch = "wasm32")]
mod wasm_state;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use async_trait::async_trait;
    use gloo_net::http::Request;
    use gloo_timers::future::TimeoutFuture;
    use host_shell_core::config::{
        ENV_APPLICATION_BASE_URL, ENV_DEPLOY_ENV, ENV_REMOTES, ENV_YOUR_ID_LOGIN_URL,
    };
    use host_shell_core::error::error_from_response;
    use host_shell_core::registry::{applications_count_label, applications_url};
    use host_shell_core::session::{TOKEN_STORAGE_KEY, current_user_url};
    use host_shell_core::{
        Application, ApplicationId, BasenameSlot, BrowserLocation, ConfigError, HistoryUpdate,
        HostApiError, HostConfig, HostErrorKind, HostGlobals, HostShell, IdentityTransport,
        LoadStage, ModuleLocator, MountId, RegistryTransport, RemoteLoadError, RemoteModuleLoader,
        SessionAuthenticator, ShellEffects, ShellView, SortOrder, TokenStore, TokenStoreError,
        UserProfile, ViewResult,
    };
    use serde::Deserialize;
    use tracing::{debug, error, info, warn};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{HtmlElement, HtmlIFrameElement, HtmlSelectElement, MouseEvent};

    use crate::console_level::ConsoleLevel;
    use crate::wasm_constants::*;
    use crate::wasm_state::BootDiagnostics;

    mod dom;
    mod lifecycle;
    mod logging;
    mod network;
    mod remote;
    mod routing;

    use dom::*;
    use lifecycle::*;
    use logging::*;
    use network::*;
    use remote::*;
    use routing::*;

    thread_local! {
        static SHELL: RefCell<Option<HostShell>> = const { RefCell::new(None) };
        static DIAGNOSTICS: RefCell<BootDiagnostics> = RefCell::new(BootDiagnostics::default());
        static RENDERED_CONTENT_KEY: RefCell<Option<String>> = const { RefCell::new(None) };
        static REMOTE_CONTAINERS: RefCell<HashMap<String, JsValue>> = RefCell::new(HashMap::new());
        static ROUTE_POPSTATE_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static SHELL_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static SORT_CHANGE_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        install_console_logging();
        set_boot_phase("booting", "initializing host shell runtime");
        spawn_local(async {
            if let Err(error) = boot().await {
                set_boot_error(&error);
            }
        });
    }

    #[wasm_bindgen]
    pub fn boot_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    #[wasm_bindgen]
    pub fn shell_state_json() -> String {
        SHELL.with(|slot| {
            slot.borrow()
                .as_ref()
                .and_then(|shell| serde_json::to_string(&shell.snapshot()).ok())
                .unwrap_or_else(|| "{}".to_string())
        })
    }

    #[wasm_bindgen]
    pub fn host_select_application(id: String) {
        match id.trim().parse::<ApplicationId>() {
            Ok(id) => apply_shell(|shell| shell.select(id)),
            Err(_) => warn!(id = %id, "ignoring selection with non-numeric id"),
        }
    }

    #[wasm_bindgen]
    pub fn host_go_home() {
        apply_shell(HostShell::go_home);
    }

    #[wasm_bindgen]
    pub fn host_toggle_sidebar() -> bool {
        let expanded = with_shell_mut(HostShell::toggle_sidebar).unwrap_or(true);
        render_shell_dom();
        expanded
    }

    #[wasm_bindgen]
    pub fn host_set_sort_order(sort_order: String) {
        match sort_order.parse::<SortOrder>() {
            Ok(sort_order) => apply_shell(|shell| shell.set_sort_order(sort_order)),
            Err(error) => warn!(%error, "ignoring unknown sort order"),
        }
    }

    async fn boot() -> Result<(), String> {
        let config = runtime_config().map_err(|error| error.to_string())?;
        info!(
            env = %config.env,
            remotes = config.remotes.entries().len(),
            root = %config.root_path,
            "host shell configured"
        );

        ensure_shell_dom()?;
        install_browser_navigation_handlers();

        let current_path = current_pathname();
        update_diagnostics_route(&current_path);
        let globals: Rc<dyn HostGlobals> = Rc::new(WindowGlobals);
        let shell = HostShell::new(config.clone(), BasenameSlot::new(globals), &current_path);
        SHELL.with(|slot| *slot.borrow_mut() = Some(shell));
        render_shell_dom();

        set_boot_phase("booting", "confirming session");
        let store = LocalTokenStore;
        let location = BrowserAddressBar;
        let backend = BrowserBackend::new(&config);
        let session = SessionAuthenticator::new(&config, &store, &location, &backend)
            .authenticate()
            .await;
        apply_shell(|shell| shell.set_session(session));

        set_boot_phase("ready", "host shell running");
        Ok(())
    }

    pub(super) fn with_shell_mut<R>(f: impl FnOnce(&mut HostShell) -> R) -> Option<R> {
        SHELL.with(|slot| slot.borrow_mut().as_mut().map(f))
    }

    /// Runs one shell transition, performs its effects and re-renders. The
    /// shell borrow is released before any effect runs.
    pub(super) fn apply_shell(f: impl FnOnce(&mut HostShell) -> ShellEffects) {
        if let Some(effects) = with_shell_mut(f) {
            run_effects(effects);
        }
        render_shell_dom();
    }

    fn run_effects(effects: ShellEffects) {
        if let Some(HistoryUpdate::Replace(path)) = effects.history {
            replace_route_in_browser_history(&path);
        }

        let backend = with_shell_mut(|shell| BrowserBackend::new(shell.config()));
        if let (Some(request), Some(backend)) = (effects.fetch, backend) {
            spawn_local(async move {
                let result = request.execute(&backend).await;
                apply_shell(|shell| shell.complete_fetch(request.ticket, result));
            });
        }

        if let Some(load) = effects.load {
            DIAGNOSTICS.with(|state| state.borrow_mut().remote_loads_started += 1);
            spawn_local(async move {
                // the boundary's mount element must be in the document first
                TimeoutFuture::new(0).await;
                let result = load.run(&FederatedModuleLoader).await;
                let failure = with_shell_mut(|shell| shell.finish_load(load.mount_id, result)).flatten();
                if failure.is_some() {
                    DIAGNOSTICS.with(|state| state.borrow_mut().remote_loads_failed += 1);
                }
                render_shell_dom();
            });
        }

        if effects.schedule_apply {
            schedule_navigation_apply();
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{boot_diagnostics_json, shell_state_json};

#[cfg(not(target_arch = "wasm32"))]
pub fn shell_state_json() -> String {
    "{\"session_status\":\"native\",\"detail\":\"host shell state only available on wasm\"}".to_string()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn boot_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"host shell diagnostics only available on wasm\"}".to_string()
}
