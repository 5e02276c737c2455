use super::*;

    /// HTTP side of the shell: identity confirmation and the application
    /// registry, both against `VITE_APPLICATION_MICROSERVICE_URL`.
    pub(super) struct BrowserBackend {
        base_url: String,
    }

    impl BrowserBackend {
        pub(super) fn new(config: &HostConfig) -> Self {
            Self {
                base_url: config.application_base_url.clone(),
            }
        }
    }

    #[async_trait(?Send)]
    impl IdentityTransport for BrowserBackend {
        async fn fetch_current_user(&self, token: &str) -> Result<UserProfile, HostApiError> {
            get_json(&current_user_url(&self.base_url), token).await
        }
    }

    #[async_trait(?Send)]
    impl RegistryTransport for BrowserBackend {
        async fn fetch_applications(
            &self,
            token: &str,
            sort_order: SortOrder,
        ) -> Result<Vec<Application>, HostApiError> {
            get_json(&applications_url(&self.base_url, sort_order), token).await
        }
    }

    pub(super) async fn get_json<T: for<'de> Deserialize<'de>>(
        url: &str,
        token: &str,
    ) -> Result<T, HostApiError> {
        let response = Request::get(url)
            .header("content-type", "application/json")
            .header("authorization", &format!("Bearer {token}"))
            .send()
            .await
            .map_err(map_network_error)?;
        decode_json_response(response).await
    }

    pub(super) fn map_network_error(error: gloo_net::Error) -> HostApiError {
        HostApiError::network(error.to_string())
    }

    pub(super) async fn decode_json_response<T: for<'de> Deserialize<'de>>(
        response: gloo_net::http::Response,
    ) -> Result<T, HostApiError> {
        let status = response.status();
        let raw = response.text().await.map_err(|error| HostApiError {
            status_code: status,
            code: Some("response_read_failed".to_string()),
            message: error.to_string(),
            kind: HostErrorKind::Unknown,
        })?;

        if !(200..=299).contains(&status) {
            return Err(error_from_response(status, &raw));
        }

        serde_json::from_str(&raw).map_err(|error| {
            HostApiError::decode(status, format!("failed to decode response: {error}"))
        })
    }
