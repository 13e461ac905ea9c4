//! Errors raised by the digest renderer and sinks.

use std::path::PathBuf;

use thiserror::Error;
use tracker::SinkError;

#[derive(Debug, Error)]
pub enum MailerError {
    /// The embedded template failed to compile.
    #[error("digest template is invalid: {0}")]
    Template(#[source] upon::Error),

    #[error("unable to render digest page {page}: {source}")]
    Render {
        page: usize,
        #[source]
        source: upon::Error,
    },

    /// A configured mail address could not be parsed.
    #[error("invalid mail address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("unable to build digest message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<MailerError> for SinkError {
    fn from(error: MailerError) -> Self {
        match error {
            MailerError::Template(_) | MailerError::Render { .. } => {
                SinkError::Render(error.to_string())
            }
            MailerError::Address { .. }
            | MailerError::Message(_)
            | MailerError::Smtp(_)
            | MailerError::Write { .. } => SinkError::Delivery(error.to_string()),
        }
    }
}
