use super::*;

    fn document() -> Option<web_sys::Document> {
        web_sys::window()?.document()
    }

    pub(super) fn element_by_id(id: &str) -> Option<HtmlElement> {
        document()?
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    pub(super) fn remote_mount_element(mount_id: MountId) -> Option<web_sys::Element> {
        document()?.get_element_by_id(&format!("{REMOTE_MOUNT_ID_PREFIX}{}", mount_id.0))
    }

    fn create_html(
        document: &web_sys::Document,
        tag: &str,
        styles: &[(&str, &str)],
    ) -> Result<HtmlElement, String> {
        let element = document
            .create_element(tag)
            .map_err(|_| format!("failed to create {tag} element"))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| format!("{tag} element is not HtmlElement"))?;
        apply_styles(&element, styles);
        Ok(element)
    }

    fn apply_styles(element: &HtmlElement, styles: &[(&str, &str)]) {
        for (property, value) in styles {
            let _ = element.style().set_property(property, value);
        }
    }

    fn append_text(
        document: &web_sys::Document,
        parent: &HtmlElement,
        tag: &str,
        text: &str,
        styles: &[(&str, &str)],
    ) -> Option<HtmlElement> {
        let element = create_html(document, tag, styles).ok()?;
        element.set_inner_text(text);
        parent.append_child(&element).ok()?;
        Some(element)
    }

    pub(super) fn ensure_shell_dom() -> Result<(), String> {
        let document = document().ok_or_else(|| "document is unavailable".to_string())?;
        let body = document
            .body()
            .ok_or_else(|| "document body is unavailable".to_string())?;
        apply_styles(
            &body,
            &[
                ("margin", "0"),
                ("background", "#f8fafc"),
                ("font-family", "Inter, system-ui, sans-serif"),
            ],
        );

        if document.get_element_by_id(STATUS_ID).is_none() {
            let status = create_html(
                &document,
                "div",
                &[
                    ("position", "fixed"),
                    ("bottom", "12px"),
                    ("right", "12px"),
                    ("font-family", "monospace"),
                    ("font-size", "12px"),
                    ("color", "#64748b"),
                    ("z-index", "50"),
                ],
            )?;
            status.set_id(STATUS_ID);
            status.set_inner_text("Boot: starting");
            body.append_child(&status)
                .map_err(|_| "failed to append status element".to_string())?;
        }

        if document.get_element_by_id(ROOT_ID).is_some() {
            return Ok(());
        }

        let root = create_html(
            &document,
            "div",
            &[("display", "flex"), ("height", "100vh"), ("overflow", "hidden")],
        )?;
        root.set_id(ROOT_ID);

        let sidebar = create_html(
            &document,
            "nav",
            &[
                ("display", "none"),
                ("flex-direction", "column"),
                ("gap", "4px"),
                ("padding", "12px 8px"),
                ("background", "#0f172a"),
                ("color", "#e2e8f0"),
                ("overflow-y", "auto"),
                ("transition", "width 150ms ease"),
                ("box-sizing", "border-box"),
            ],
        )?;
        sidebar.set_id(SIDEBAR_ID);

        let main = create_html(
            &document,
            "main",
            &[
                ("flex", "1"),
                ("display", "flex"),
                ("flex-direction", "column"),
                ("min-width", "0"),
            ],
        )?;

        let header = create_html(
            &document,
            "header",
            &[
                ("display", "none"),
                ("align-items", "center"),
                ("justify-content", "space-between"),
                ("gap", "12px"),
                ("padding", "12px 20px"),
                ("border-bottom", "1px solid #e2e8f0"),
                ("background", "#ffffff"),
            ],
        )?;
        header.set_id(HEADER_ID);

        let user = create_html(&document, "span", &[("font-size", "14px"), ("color", "#334155")])?;
        user.set_id(HEADER_USER_ID);
        header
            .append_child(&user)
            .map_err(|_| "failed to append header user".to_string())?;

        let select = document
            .create_element("select")
            .map_err(|_| "failed to create sort select".to_string())?
            .dyn_into::<HtmlSelectElement>()
            .map_err(|_| "sort select is not HtmlSelectElement".to_string())?;
        select.set_id(SORT_SELECT_ID);
        for sort_order in SortOrder::ALL {
            let option = document
                .create_element("option")
                .map_err(|_| "failed to create sort option".to_string())?;
            let _ = option.set_attribute("value", sort_order.as_str());
            option.set_text_content(Some(sort_order.label()));
            select
                .append_child(&option)
                .map_err(|_| "failed to append sort option".to_string())?;
        }
        header
            .append_child(&select)
            .map_err(|_| "failed to append sort select".to_string())?;

        let content = create_html(
            &document,
            "section",
            &[("flex", "1"), ("overflow", "auto"), ("position", "relative")],
        )?;
        content.set_id(CONTENT_ID);

        main.append_child(&header)
            .map_err(|_| "failed to append header".to_string())?;
        main.append_child(&content)
            .map_err(|_| "failed to append content".to_string())?;
        root.append_child(&sidebar)
            .map_err(|_| "failed to append sidebar".to_string())?;
        root.append_child(&main)
            .map_err(|_| "failed to append main".to_string())?;
        body.append_child(&root)
            .map_err(|_| "failed to append shell root".to_string())?;
        Ok(())
    }

    pub(super) fn render_shell_dom() {
        let Some(document) = document() else {
            return;
        };
        SHELL.with(|slot| {
            let slot = slot.borrow();
            let Some(shell) = slot.as_ref() else {
                return;
            };
            let view = shell.view();
            let chrome_visible = matches!(
                view,
                ShellView::LoadingApplications
                    | ShellView::FetchError(_)
                    | ShellView::Home { .. }
                    | ShellView::Viewer { .. }
            );
            render_header(shell, chrome_visible);
            render_sidebar(&document, shell, chrome_visible);
            render_content(&document, shell, &view);
        });
    }

    fn render_header(shell: &HostShell, visible: bool) {
        let Some(header) = element_by_id(HEADER_ID) else {
            return;
        };
        let _ = header
            .style()
            .set_property("display", if visible { "flex" } else { "none" });
        if let Some(user) = element_by_id(HEADER_USER_ID) {
            let label = shell
                .session()
                .session()
                .map(|session| session.user.username.clone())
                .unwrap_or_default();
            user.set_inner_text(&label);
        }
        if let Some(select) = element_by_id(SORT_SELECT_ID)
            .and_then(|element| element.dyn_into::<HtmlSelectElement>().ok())
        {
            select.set_value(shell.navigation().sort_order.as_str());
        }
    }

    fn render_sidebar(document: &web_sys::Document, shell: &HostShell, visible: bool) {
        let Some(sidebar) = element_by_id(SIDEBAR_ID) else {
            return;
        };
        let navigation = shell.navigation();
        let expanded = navigation.sidebar_expanded;
        apply_styles(
            &sidebar,
            &[
                ("display", if visible { "flex" } else { "none" }),
                (
                    "width",
                    if expanded {
                        SIDEBAR_EXPANDED_WIDTH
                    } else {
                        SIDEBAR_COLLAPSED_WIDTH
                    },
                ),
            ],
        );
        sidebar.set_inner_html("");
        if !visible {
            return;
        }

        let item_styles: &[(&str, &str)] = &[
            ("display", "flex"),
            ("align-items", "center"),
            ("gap", "10px"),
            ("padding", "8px"),
            ("border-radius", "8px"),
            ("cursor", "pointer"),
            ("white-space", "nowrap"),
            ("overflow", "hidden"),
        ];

        if let Some(toggle) = append_text(
            document,
            &sidebar,
            "button",
            if expanded { "\u{00ab}" } else { "\u{00bb}" },
            &[
                ("align-self", "flex-end"),
                ("background", "transparent"),
                ("border", "0"),
                ("color", "inherit"),
                ("cursor", "pointer"),
            ],
        ) {
            toggle.set_id(SIDEBAR_TOGGLE_ID);
        }

        if let Some(home) = append_text(
            document,
            &sidebar,
            "div",
            if expanded { "Home" } else { "\u{2302}" },
            item_styles,
        ) {
            let _ = home.set_attribute(HOME_ACTION_ATTRIBUTE, "");
            if navigation.selected_application_id.is_none() {
                let _ = home.style().set_property("background", "#1e293b");
            }
        }

        let Some(applications) = shell.applications() else {
            return;
        };
        for application in applications {
            let Ok(item) = create_html(document, "div", item_styles) else {
                continue;
            };
            let _ = item.set_attribute(APPLICATION_ID_ATTRIBUTE, &application.id.to_string());
            item.set_title(&application.app_name);
            if navigation.selected_application_id == Some(application.id) {
                let _ = item.style().set_property("background", "#1e293b");
            }
            if !application.is_active {
                let _ = item.style().set_property("opacity", "0.5");
            }
            let _ = append_text(
                document,
                &item,
                "span",
                &application.initials(),
                &[
                    ("display", "inline-flex"),
                    ("justify-content", "center"),
                    ("align-items", "center"),
                    ("min-width", "32px"),
                    ("height", "32px"),
                    ("border-radius", "8px"),
                    ("background", "#334155"),
                    ("font-size", "12px"),
                    ("font-weight", "600"),
                ],
            );
            if expanded {
                let _ = append_text(document, &item, "span", &application.app_name, &[("font-size", "14px")]);
            }
            let _ = sidebar.append_child(&item);
        }
    }

    /// Key identifying what the content area currently shows. Viewer content
    /// is only rebuilt when the mount changes so a mounted remote module's
    /// DOM survives unrelated re-renders.
    fn content_key(shell: &HostShell, view: &ShellView<'_>) -> Option<String> {
        let ShellView::Viewer { view, .. } = view else {
            return None;
        };
        let mount = shell.boundary().map(|boundary| boundary.mount_id().0)?;
        let kind = match view {
            ViewResult::Loading { .. } | ViewResult::Mounted { .. } => "remote",
            ViewResult::Frame(_) => "frame",
            ViewResult::Unavailable { .. } => "unavailable",
            ViewResult::Failed { .. } => "failed",
        };
        Some(format!("{kind}:{mount}"))
    }

    fn render_content(document: &web_sys::Document, shell: &HostShell, view: &ShellView<'_>) {
        let Some(content) = element_by_id(CONTENT_ID) else {
            return;
        };
        let key = content_key(shell, view);
        let unchanged = key.is_some()
            && RENDERED_CONTENT_KEY.with(|rendered| *rendered.borrow() == key);
        if unchanged {
            if let ShellView::Viewer {
                view: ViewResult::Mounted { .. },
                ..
            } = view
            {
                if let Some(overlay) = element_by_id(LOADING_OVERLAY_ID) {
                    overlay.remove();
                }
            }
            return;
        }
        RENDERED_CONTENT_KEY.with(|rendered| *rendered.borrow_mut() = key);
        content.set_inner_html("");

        let message_styles: &[(&str, &str)] = &[
            ("padding", "48px 24px"),
            ("text-align", "center"),
            ("color", "#475569"),
        ];
        match view {
            ShellView::Redirecting => {}
            ShellView::Checking => {
                let _ = append_text(document, &content, "p", "Checking your session\u{2026}", message_styles);
            }
            ShellView::AuthError(reason) => {
                let _ = append_text(
                    document,
                    &content,
                    "p",
                    &format!("Authentication error: {reason}"),
                    &[("padding", "48px 24px"), ("text-align", "center"), ("color", "#b91c1c")],
                );
            }
            ShellView::SignInPrompt => {
                let _ = append_text(document, &content, "p", "Sign in to see your applications.", message_styles);
            }
            ShellView::LoadingApplications => {
                let _ = append_text(document, &content, "p", "Loading applications\u{2026}", message_styles);
            }
            ShellView::FetchError(message) => {
                let _ = append_text(
                    document,
                    &content,
                    "p",
                    &format!("Could not load applications: {message}"),
                    &[("padding", "48px 24px"), ("text-align", "center"), ("color", "#b91c1c")],
                );
            }
            ShellView::Home { applications } => render_home(document, &content, applications),
            ShellView::Viewer { application, view } => {
                let mount = shell.boundary().map_or(MountId(0), |boundary| boundary.mount_id());
                render_viewer(document, &content, application, view, mount);
            }
        }
    }

    fn render_home(document: &web_sys::Document, content: &HtmlElement, applications: &[Application]) {
        let Ok(wrapper) = create_html(document, "div", &[("padding", "24px")]) else {
            return;
        };
        let _ = append_text(document, &wrapper, "h1", "Applications", &[("margin", "0"), ("font-size", "22px")]);
        let _ = append_text(
            document,
            &wrapper,
            "p",
            &applications_count_label(applications.len()),
            &[("color", "#64748b"), ("font-size", "14px")],
        );

        let Ok(grid) = create_html(
            document,
            "div",
            &[
                ("display", "grid"),
                ("grid-template-columns", "repeat(auto-fill, minmax(240px, 1fr))"),
                ("gap", "16px"),
            ],
        ) else {
            return;
        };
        for application in applications {
            let Ok(card) = create_html(
                document,
                "article",
                &[
                    ("padding", "16px"),
                    ("border", "1px solid #e2e8f0"),
                    ("border-radius", "12px"),
                    ("background", "#ffffff"),
                    ("cursor", "pointer"),
                ],
            ) else {
                continue;
            };
            let _ = card.set_attribute(APPLICATION_ID_ATTRIBUTE, &application.id.to_string());
            let _ = append_text(document, &card, "strong", &application.initials(), &[("color", "#2563eb")]);
            let _ = append_text(document, &card, "h2", &application.app_name, &[("font-size", "16px")]);
            if let Some(description) = application.description.as_deref() {
                let _ = append_text(document, &card, "p", description, &[("color", "#475569"), ("font-size", "14px")]);
            }
            let (background, color) = if application.is_active {
                ("#dcfce7", "#166534")
            } else {
                ("#f1f5f9", "#64748b")
            };
            let _ = append_text(
                document,
                &card,
                "span",
                application.status_label(),
                &[
                    ("font-size", "12px"),
                    ("padding", "2px 8px"),
                    ("border-radius", "999px"),
                    ("background", background),
                    ("color", color),
                ],
            );
            let _ = grid.append_child(&card);
        }
        let _ = wrapper.append_child(&grid);
        let _ = content.append_child(&wrapper);
    }

    fn render_viewer(
        document: &web_sys::Document,
        content: &HtmlElement,
        application: &Application,
        view: &ViewResult,
        mount: MountId,
    ) {
        match view {
            ViewResult::Unavailable { app_name } => {
                let _ = append_text(
                    document,
                    content,
                    "p",
                    &format!("{app_name} is not available right now."),
                    &[("padding", "48px 24px"), ("text-align", "center"), ("color", "#64748b")],
                );
            }
            ViewResult::Loading { .. } | ViewResult::Mounted { .. } => {
                let Ok(host) = create_html(document, "div", &[("width", "100%"), ("height", "100%")]) else {
                    return;
                };
                host.set_id(&format!("{REMOTE_MOUNT_ID_PREFIX}{}", mount.0));
                let _ = host.set_attribute(REMOTE_MOUNT_ATTRIBUTE, &application.id.to_string());
                let _ = content.append_child(&host);
                if matches!(view, ViewResult::Loading { .. }) {
                    if let Some(overlay) = append_text(
                        document,
                        content,
                        "div",
                        &format!("Loading {}\u{2026}", application.app_name),
                        &[
                            ("position", "absolute"),
                            ("inset", "0"),
                            ("display", "flex"),
                            ("align-items", "center"),
                            ("justify-content", "center"),
                            ("color", "#475569"),
                            ("background", "rgba(248, 250, 252, 0.8)"),
                        ],
                    ) {
                        overlay.set_id(LOADING_OVERLAY_ID);
                    }
                }
            }
            ViewResult::Frame(frame) => {
                let Ok(iframe) = document
                    .create_element("iframe")
                    .map_err(|_| ())
                    .and_then(|element| element.dyn_into::<HtmlIFrameElement>().map_err(|_| ()))
                else {
                    return;
                };
                iframe.set_src(&frame.src);
                iframe.set_title(&frame.title);
                let _ = iframe.set_attribute("sandbox", frame.sandbox);
                let _ = iframe.set_attribute(
                    "style",
                    "width: 100%; height: 100%; border: 0; display: block;",
                );
                let _ = content.append_child(&iframe);
            }
            ViewResult::Failed { stage, message } => {
                let Ok(panel) = create_html(
                    document,
                    "div",
                    &[("padding", "48px 24px"), ("text-align", "center"), ("color", "#b91c1c")],
                ) else {
                    return;
                };
                let stage = match stage {
                    LoadStage::Download => "could not be downloaded",
                    LoadStage::Render => "failed while rendering",
                };
                let _ = append_text(document, &panel, "h2", &format!("{} {stage}", application.app_name), &[]);
                let _ = append_text(document, &panel, "p", message, &[("color", "#475569")]);
                if let Some(retry) = append_text(document, &panel, "button", "Try again", &[("margin-right", "8px")]) {
                    let _ = retry.set_attribute(APPLICATION_ID_ATTRIBUTE, &application.id.to_string());
                }
                if let Some(home) = append_text(document, &panel, "button", "Back to home", &[]) {
                    let _ = home.set_attribute(HOME_ACTION_ATTRIBUTE, "");
                }
                let _ = content.append_child(&panel);
            }
        }
    }
