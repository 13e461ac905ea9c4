//! StarWatch digest delivery adapter.
//!
//! Implements [`tracker::DigestSink`] twice over one HTML renderer:
//!
//! | Sink | Delivery |
//! |------|----------|
//! | [`SmtpSink`] | one HTML mail per page (implicit TLS or STARTTLS) |
//! | [`DirectorySink`] | one `digest-NNN.html` file per page |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Pages arrive
//! already packed and grouped; the sinks only render and deliver them.

pub mod directory;
pub mod error;
pub mod renderer;
pub mod smtp;

pub use directory::DirectorySink;
pub use error::MailerError;
pub use renderer::{DigestRenderer, DEFAULT_SUBJECT};
pub use smtp::{SmtpSecurity, SmtpSettings, SmtpSink, SMTP_TIMEOUT};
