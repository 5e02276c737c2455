use super::*;

    #[wasm_bindgen(inline_js = "export function import_remote_entry(url) { return import(/* @vite-ignore */ url); }")]
    extern "C" {
        #[wasm_bindgen(catch)]
        fn import_remote_entry(url: &str) -> Result<js_sys::Promise, JsValue>;
    }

    /// Publishes the mounted module's basename and the hosted marker on
    /// `window`, where remote routers read them.
    pub(super) struct WindowGlobals;

    impl HostGlobals for WindowGlobals {
        fn publish_basename(&self, basename: &str) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let _ = js_sys::Reflect::set(
                &window,
                &JsValue::from_str(MF_BASENAME_GLOBAL),
                &JsValue::from_str(basename),
            );
            let _ = js_sys::Reflect::set(&window, &JsValue::from_str(MF_HOST_GLOBAL), &JsValue::TRUE);
        }

        fn clear_basename(&self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let _ = js_sys::Reflect::delete_property(&window, &JsValue::from_str(MF_BASENAME_GLOBAL));
            let _ = js_sys::Reflect::delete_property(&window, &JsValue::from_str(MF_HOST_GLOBAL));
        }
    }

    /// Loads federation containers (`remoteEntry.js`) with a dynamic
    /// `import()`, resolves the exposed module and mounts it into the
    /// boundary's element through its `mount(element, { basename })` (or
    /// default) export.
    pub(super) struct FederatedModuleLoader;

    #[async_trait(?Send)]
    impl RemoteModuleLoader for FederatedModuleLoader {
        type Module = JsValue;

        async fn download(&self, locator: &ModuleLocator) -> Result<JsValue, RemoteLoadError> {
            let container = load_container(locator.container()).await?;
            let get = function_property(&container, "get").ok_or_else(|| {
                RemoteLoadError::download(format!(
                    "remote container `{}` has no get()",
                    locator.container()
                ))
            })?;
            let exposed = locator.exposed_module();
            let factory = get
                .call1(&container, &JsValue::from_str(&exposed))
                .map_err(|error| RemoteLoadError::download(js_error_message(&error)))?;
            let factory = await_value(factory)
                .await
                .map_err(|error| RemoteLoadError::download(js_error_message(&error)))?;
            let module = match factory.dyn_ref::<js_sys::Function>() {
                Some(factory) => factory
                    .call0(&JsValue::UNDEFINED)
                    .map_err(|error| RemoteLoadError::download(js_error_message(&error)))?,
                None => factory,
            };
            debug!(%locator, "remote module resolved");
            Ok(module)
        }

        fn render_first(
            &self,
            module: &JsValue,
            mount_id: MountId,
            basename: &str,
        ) -> Result<(), RemoteLoadError> {
            let element = remote_mount_element(mount_id)
                .ok_or_else(|| RemoteLoadError::render("mount point is no longer in the document"))?;
            let mount = function_property(module, "mount")
                .or_else(|| function_property(module, "default"))
                .ok_or_else(|| RemoteLoadError::render("remote module exports no mount function"))?;

            let options = js_sys::Object::new();
            let _ = js_sys::Reflect::set(
                &options,
                &JsValue::from_str("basename"),
                &JsValue::from_str(basename),
            );
            mount
                .call2(module, &element, &options)
                .map_err(|error| RemoteLoadError::render(js_error_message(&error)))?;
            Ok(())
        }
    }

    async fn load_container(container: &str) -> Result<JsValue, RemoteLoadError> {
        if let Some(cached) = REMOTE_CONTAINERS.with(|cache| cache.borrow().get(container).cloned()) {
            return Ok(cached);
        }

        let entry_url = remote_entry_url(container).ok_or_else(|| {
            RemoteLoadError::download(format!("no remote entry registered for `{container}`"))
        })?;
        debug!(container, entry_url = %entry_url, "importing remote entry");
        let promise = import_remote_entry(&entry_url)
            .map_err(|error| RemoteLoadError::download(js_error_message(&error)))?;
        let namespace = JsFuture::from(promise)
            .await
            .map_err(|error| RemoteLoadError::download(js_error_message(&error)))?;

        if let Some(init) = function_property(&namespace, "init") {
            let shared = init
                .call1(&namespace, &js_sys::Object::new())
                .map_err(|error| RemoteLoadError::download(js_error_message(&error)))?;
            await_value(shared)
                .await
                .map_err(|error| RemoteLoadError::download(js_error_message(&error)))?;
        }

        REMOTE_CONTAINERS.with(|cache| {
            cache
                .borrow_mut()
                .insert(container.to_string(), namespace.clone());
        });
        Ok(namespace)
    }

    /// `window.__HOST_REMOTE_ENTRIES__[container]`, falling back to the
    /// production entries.
    pub(super) fn remote_entry_url(container: &str) -> Option<String> {
        let injected = web_sys::window()
            .and_then(|window| {
                js_sys::Reflect::get(&window, &JsValue::from_str(REMOTE_ENTRIES_GLOBAL)).ok()
            })
            .filter(|entries| entries.is_object())
            .and_then(|entries| js_sys::Reflect::get(&entries, &JsValue::from_str(container)).ok())
            .and_then(|value| value.as_string())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        injected.or_else(|| {
            DEFAULT_REMOTE_ENTRIES
                .iter()
                .find(|(name, _)| *name == container)
                .map(|(_, url)| (*url).to_string())
        })
    }

    fn function_property(target: &JsValue, name: &str) -> Option<js_sys::Function> {
        js_sys::Reflect::get(target, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
    }

    async fn await_value(value: JsValue) -> Result<JsValue, JsValue> {
        JsFuture::from(js_sys::Promise::resolve(&value)).await
    }

    pub(super) fn js_error_message(error: &JsValue) -> String {
        if let Some(message) = js_sys::Reflect::get(error, &JsValue::from_str("message"))
            .ok()
            .and_then(|value| value.as_string())
            .filter(|message| !message.trim().is_empty())
        {
            return message;
        }
        error
            .as_string()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "unknown error".to_string())
    }
