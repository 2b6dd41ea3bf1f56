//! Runtime intake of client log batches

pub mod cors;
pub mod once_only;
pub mod processor;
pub mod request;
pub mod state;

pub use cors::{CorsDecision, CorsPolicy};
pub use once_only::{OnceOnlyFilter, OnceOnlySet, RuleState};
pub use processor::{process_log_request, RequestProcessor, RequestProcessorBuilder};
pub use request::{LogRequest, LogResponse, STATUS_BAD_REQUEST, STATUS_FORBIDDEN, STATUS_OK};
pub use state::{IntakeState, LoggerState};
