use super::*;

    /// `window.location` for the login handshake.
    pub(super) struct BrowserAddressBar;

    impl BrowserLocation for BrowserAddressBar {
        fn href(&self) -> String {
            web_sys::window()
                .and_then(|window| window.location().href().ok())
                .unwrap_or_default()
        }

        fn replace_url(&self, url: &str) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let Ok(history) = window.history() else {
                return;
            };
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(url));
        }

        fn navigate_away(&self, url: &str) {
            let Some(window) = web_sys::window() else {
                return;
            };
            if window.location().set_href(url).is_err() {
                warn!("failed to navigate to identity service");
            }
        }
    }

    pub(super) fn install_browser_navigation_handlers() {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        ROUTE_POPSTATE_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                let path = current_pathname();
                update_diagnostics_route(&path);
                apply_shell(|shell| shell.location_changed(&path));
            }));
            let _ = window
                .add_event_listener_with_callback("popstate", callback.as_ref().unchecked_ref());
            *slot.borrow_mut() = Some(callback);
        });

        SHELL_CLICK_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
                handle_shell_click(event);
            }));
            let _ = document.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
            *slot.borrow_mut() = Some(callback);
        });

        SORT_CHANGE_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
                let Some(select) = event
                    .target()
                    .and_then(|target| target.dyn_into::<HtmlSelectElement>().ok())
                else {
                    return;
                };
                if select.id() != SORT_SELECT_ID {
                    return;
                }
                match select.value().parse::<SortOrder>() {
                    Ok(sort_order) => apply_shell(|shell| shell.set_sort_order(sort_order)),
                    Err(error) => warn!(%error, "ignoring unknown sort order"),
                }
            }));
            let _ = document.add_event_listener_with_callback("change", callback.as_ref().unchecked_ref());
            *slot.borrow_mut() = Some(callback);
        });
    }

    /// Clicks on anything carrying an application id, the home action or the
    /// sidebar toggle. Everything else is left to the page (and to mounted
    /// remote modules).
    pub(super) fn handle_shell_click(event: web_sys::Event) {
        if event.default_prevented() {
            return;
        }
        if let Some(mouse_event) = event.dyn_ref::<MouseEvent>() {
            if mouse_event.button() != 0 || mouse_event.meta_key() || mouse_event.ctrl_key() {
                return;
            }
        }
        let Some(target) = event
            .target()
            .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
        else {
            return;
        };
        if target
            .closest(&format!("[{REMOTE_MOUNT_ATTRIBUTE}]"))
            .ok()
            .flatten()
            .is_some()
        {
            return;
        }

        if target.closest(&format!("#{SIDEBAR_TOGGLE_ID}")).ok().flatten().is_some() {
            event.prevent_default();
            let expanded = with_shell_mut(HostShell::toggle_sidebar).unwrap_or(true);
            debug!(expanded, "sidebar toggled");
            render_shell_dom();
            return;
        }

        if target.closest(&format!("[{HOME_ACTION_ATTRIBUTE}]")).ok().flatten().is_some() {
            event.prevent_default();
            apply_shell(HostShell::go_home);
            return;
        }

        let Some(item) = target
            .closest(&format!("[{APPLICATION_ID_ATTRIBUTE}]"))
            .ok()
            .flatten()
        else {
            return;
        };
        let Some(id) = item
            .get_attribute(APPLICATION_ID_ATTRIBUTE)
            .and_then(|raw| raw.parse::<ApplicationId>().ok())
        else {
            return;
        };
        event.prevent_default();
        apply_shell(|shell| shell.select(id));
    }

    /// Absolute application urls stay out of the host's history.
    pub(super) fn replace_route_in_browser_history(path: &str) {
        if !path.starts_with('/') {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(history) = window.history() else {
            return;
        };
        if current_pathname() == path {
            return;
        }
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        update_diagnostics_route(path);
    }

    /// Runs the second phase of a location change on the next turn of the
    /// event loop.
    pub(super) fn schedule_navigation_apply() {
        spawn_local(async {
            TimeoutFuture::new(0).await;
            apply_shell(HostShell::apply_pending_navigation);
        });
    }

    pub(super) fn update_diagnostics_route(path: &str) {
        DIAGNOSTICS.with(|state| {
            state.borrow_mut().route_path = path.to_string();
        });
    }
