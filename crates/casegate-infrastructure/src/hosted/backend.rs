use casegate_core::config::BackendSettings;
use casegate_core::{CasegateError, Result};
use reqwest::{RequestBuilder, StatusCode};

/// Base URL, anon key and HTTP client shared by the hosted adapters.
#[derive(Clone)]
pub struct HostedBackend {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

// The anon key stays out of logs.
impl std::fmt::Debug for HostedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedBackend")
            .field("url", &self.url)
            .field("anon_key", &if self.anon_key.is_empty() { "" } else { "***" })
            .finish_non_exhaustive()
    }
}

impl HostedBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        if settings.url.trim().is_empty() {
            return Err(CasegateError::config("backend.url is empty"));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CasegateError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    /// Starts a request with the project key and, when given, the subject's bearer token.
    pub fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        bearer: Option<&str>,
    ) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }
}

/// Maps a non-success status of a data read onto the error taxonomy.
pub(crate) fn read_status_error(status: StatusCode, body: &str) -> CasegateError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CasegateError::permission_denied(format!("{}: {}", status, body))
        }
        _ => CasegateError::network(format!("unexpected status {}: {}", status, body)),
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> CasegateError {
    CasegateError::network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let backend = HostedBackend::new(&BackendSettings {
            url: "https://tenant.example.com/".to_string(),
            anon_key: "anon".to_string(),
        })
        .unwrap();
        assert_eq!(
            backend.endpoint("/auth/v1/logout"),
            "https://tenant.example.com/auth/v1/logout"
        );
    }

    #[test]
    fn test_empty_url_rejected() {
        let settings = BackendSettings {
            url: " ".to_string(),
            anon_key: String::new(),
        };
        assert!(HostedBackend::new(&settings).unwrap_err().is_config());
    }

    #[test]
    fn test_debug_masks_anon_key() {
        let backend = HostedBackend::new(&BackendSettings {
            url: "https://tenant.example.com".to_string(),
            anon_key: "secret-anon-key".to_string(),
        })
        .unwrap();
        let rendered = format!("{:?}", backend);
        assert!(rendered.contains("tenant.example.com"));
        assert!(!rendered.contains("secret-anon-key"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(read_status_error(StatusCode::FORBIDDEN, "").is_permission_denied());
        assert!(matches!(
            read_status_error(StatusCode::BAD_GATEWAY, ""),
            CasegateError::Network(_)
        ));
    }
}
