//! Cross-origin checks for the intake endpoint

use super::request::{LogRequest, LogResponse};
use crate::config::Pattern;

pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";
pub const MAX_AGE_HEADER: &str = "Access-Control-Max-Age";
pub const ALLOW_METHODS_HEADER: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS_HEADER: &str = "Access-Control-Allow-Headers";

/// Seconds a browser may cache a pre-flight answer
pub const PREFLIGHT_MAX_AGE: u32 = 3600;
pub const ALLOWED_METHODS: &str = "POST";
pub const ALLOWED_HEADERS: &str = "jsnlog-requestid, content-type";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// No allowed-origins pattern configured, or not a cross-origin request
    NotApplicable,
    Allowed { origin: String },
    Rejected,
}

#[derive(Debug, Clone, Copy)]
pub struct CorsPolicy<'a> {
    allowed_origins: Option<&'a Pattern>,
}

impl<'a> CorsPolicy<'a> {
    pub fn new(allowed_origins: Option<&'a Pattern>) -> Self {
        Self { allowed_origins }
    }

    /// Judge a request
    ///
    /// Only pre-flights and requests carrying an `Origin` header are checked.
    /// A pre-flight without an origin cannot be matched and is rejected.
    pub fn evaluate(&self, request: &LogRequest) -> CorsDecision {
        let Some(pattern) = self.allowed_origins else {
            return CorsDecision::NotApplicable;
        };
        if !request.is_preflight() && request.origin.is_none() {
            return CorsDecision::NotApplicable;
        }

        match request.origin.as_deref() {
            Some(origin) if pattern.is_match(origin) => CorsDecision::Allowed {
                origin: origin.to_string(),
            },
            _ => CorsDecision::Rejected,
        }
    }

    /// Headers for an allowed origin; pre-flights get the full set
    pub fn apply_headers(origin: &str, preflight: bool, response: &mut LogResponse) {
        response.set_header(ALLOW_ORIGIN_HEADER, origin);
        if preflight {
            response.set_header(MAX_AGE_HEADER, PREFLIGHT_MAX_AGE.to_string());
            response.set_header(ALLOW_METHODS_HEADER, ALLOWED_METHODS);
            response.set_header(ALLOW_HEADERS_HEADER, ALLOWED_HEADERS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Pattern {
        Pattern::new(r"^https?:\/\/([a-z0-9]+[.])*(my-abc-domain[.]com|my-xyz-domain[.]com)$")
            .unwrap()
    }

    #[test]
    fn test_not_applicable_without_pattern() {
        let policy = CorsPolicy::new(None);
        let request = LogRequest::new().with_origin("https://evil.com");
        assert_eq!(policy.evaluate(&request), CorsDecision::NotApplicable);
    }

    #[test]
    fn test_same_origin_post_is_not_checked() {
        let pattern = pattern();
        let policy = CorsPolicy::new(Some(&pattern));
        assert_eq!(policy.evaluate(&LogRequest::new()), CorsDecision::NotApplicable);
    }

    #[test]
    fn test_origin_matching() {
        let pattern = pattern();
        let policy = CorsPolicy::new(Some(&pattern));

        let allowed = LogRequest::new().with_origin("https://sub.my-abc-domain.com");
        assert_eq!(
            policy.evaluate(&allowed),
            CorsDecision::Allowed {
                origin: "https://sub.my-abc-domain.com".into()
            }
        );

        let evil = LogRequest::new().with_origin("https://evil.com");
        assert_eq!(policy.evaluate(&evil), CorsDecision::Rejected);

        let bare_preflight = LogRequest::new().with_method("OPTIONS");
        assert_eq!(policy.evaluate(&bare_preflight), CorsDecision::Rejected);
    }

    #[test]
    fn test_preflight_headers() {
        let mut response = LogResponse::ok();
        CorsPolicy::apply_headers("https://my-abc-domain.com", true, &mut response);
        assert_eq!(response.header(ALLOW_ORIGIN_HEADER), Some("https://my-abc-domain.com"));
        assert_eq!(response.header(MAX_AGE_HEADER), Some("3600"));
        assert_eq!(response.header(ALLOW_METHODS_HEADER), Some("POST"));
        assert_eq!(response.header(ALLOW_HEADERS_HEADER), Some("jsnlog-requestid, content-type"));

        let mut response = LogResponse::ok();
        CorsPolicy::apply_headers("https://my-abc-domain.com", false, &mut response);
        assert_eq!(response.headers.len(), 1);
    }
}
