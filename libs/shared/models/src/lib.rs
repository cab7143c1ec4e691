pub mod alert;
pub mod error;

pub use alert::{Alert, AlertSubject, Owner};
pub use error::AppError;
