//! Request and response surface of the intake endpoint

use std::collections::BTreeMap;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_FORBIDDEN: u16 = 403;

/// Request metadata supplied by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub method: String,
    pub origin: Option<String>,
    pub user_agent: String,
    pub user_host_address: String,
    pub request_id: Option<String>,
    pub url: String,
}

impl Default for LogRequest {
    fn default() -> Self {
        Self {
            method: "POST".to_string(),
            origin: None,
            user_agent: String::new(),
            user_host_address: String::new(),
            request_id: None,
            url: String::new(),
        }
    }
}

impl LogRequest {
    /// A `POST` with no metadata
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_user_host_address(mut self, address: impl Into<String>) -> Self {
        self.user_host_address = address.into();
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn is_preflight(&self) -> bool {
        self.method.eq_ignore_ascii_case("OPTIONS")
    }
}

/// Status and headers for the host to write back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

impl LogResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(STATUS_OK)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
