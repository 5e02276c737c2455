use super::*;

    pub(super) fn set_boot_phase(phase: &str, detail: &str) {
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.phase = phase.to_string();
            state.detail = detail.to_string();
            if phase != "error" {
                state.last_error = None;
            }
        });
        update_status_dom(phase, detail, false);
    }

    pub(super) fn set_boot_error(message: &str) {
        error!(message, "host shell startup failed");
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.phase = "error".to_string();
            state.detail = "startup failed".to_string();
            state.last_error = Some(message.to_string());
        });
        update_status_dom("error", message, true);
    }

    pub(super) fn update_status_dom(phase: &str, detail: &str, is_error: bool) {
        let Some(status) = element_by_id(STATUS_ID) else {
            return;
        };
        let ready = phase == "ready";
        let _ = status
            .style()
            .set_property("display", if ready { "none" } else { "block" });
        let label = if is_error { "Boot error" } else { "Boot" };
        status.set_inner_text(&format!("{label}: {phase} ({detail})"));
        let color = if is_error { "#f87171" } else { "#64748b" };
        let _ = status.style().set_property("color", color);
    }

    pub(super) fn current_pathname() -> String {
        let Some(window) = web_sys::window() else {
            return "/".to_string();
        };
        let Ok(pathname) = window.location().pathname() else {
            return "/".to_string();
        };
        if pathname.trim().is_empty() {
            "/".to_string()
        } else {
            pathname
        }
    }

    /// `window._env_[key]`, injected at container start.
    pub(super) fn runtime_env_value(key: &str) -> Option<String> {
        let window = web_sys::window()?;
        let env = js_sys::Reflect::get(&window, &JsValue::from_str(RUNTIME_ENV_GLOBAL)).ok()?;
        if !env.is_object() {
            return None;
        }
        let value = js_sys::Reflect::get(&env, &JsValue::from_str(key)).ok()?;
        let value = value.as_string()?.trim().to_string();
        if value.is_empty() { None } else { Some(value) }
    }

    fn build_time_env(key: &str) -> Option<String> {
        let value = match key {
            ENV_APPLICATION_BASE_URL => option_env!("VITE_APPLICATION_MICROSERVICE_URL"),
            ENV_YOUR_ID_LOGIN_URL => option_env!("VITE_YOUR_ID_LOGIN_URL"),
            ENV_DEPLOY_ENV => option_env!("VITE_ENV"),
            ENV_REMOTES => option_env!("VITE_REMOTES"),
            _ => None,
        }?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub(super) fn runtime_config() -> Result<HostConfig, ConfigError> {
        HostConfig::from_lookup(|key| runtime_env_value(key).or_else(|| build_time_env(key)))
    }

    /// The session token in `localStorage`.
    pub(super) struct LocalTokenStore;

    impl LocalTokenStore {
        fn storage() -> Result<web_sys::Storage, TokenStoreError> {
            let window = web_sys::window().ok_or(TokenStoreError::Unavailable)?;
            window
                .local_storage()
                .map_err(|_| TokenStoreError::Unavailable)?
                .ok_or(TokenStoreError::Unavailable)
        }
    }

    impl TokenStore for LocalTokenStore {
        fn load_token(&self) -> Result<Option<String>, TokenStoreError> {
            Self::storage()?
                .get_item(TOKEN_STORAGE_KEY)
                .map_err(|error| TokenStoreError::Read(js_error_message(&error)))
        }

        fn save_token(&self, token: &str) -> Result<(), TokenStoreError> {
            Self::storage()?
                .set_item(TOKEN_STORAGE_KEY, token)
                .map_err(|error| TokenStoreError::Write(js_error_message(&error)))
        }

        fn clear_token(&self) -> Result<(), TokenStoreError> {
            Self::storage()?
                .remove_item(TOKEN_STORAGE_KEY)
                .map_err(|error| TokenStoreError::Write(js_error_message(&error)))
        }
    }
