mod accept_status;
mod requests_logging;

pub use accept_status::accept_status;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
