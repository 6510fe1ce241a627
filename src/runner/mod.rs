mod analyze;
mod retry;

pub use analyze::Analyzer;
pub use retry::retry_with_backoff;
