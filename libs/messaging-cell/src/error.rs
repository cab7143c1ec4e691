use thiserror::Error;

use alerting_cell::DispatchError;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Inbound message is missing the '{0}' field")]
    MissingField(&'static str),

    #[error("Sender {0} is not a registered owner")]
    UnknownSender(String),

    #[error("Failed to text {to}: {source}")]
    Delivery {
        to: String,
        #[source]
        source: DispatchError,
    },
}
