pub mod phone;
pub mod retry;
pub mod test_utils;

pub use retry::{retry, AttemptError, RetryError, RetryPolicy};
