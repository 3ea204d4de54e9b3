//! Shared building blocks for the proctor client.
//!
//! Kept free of any bus or transport knowledge so every crate in the
//! workspace can depend on it:
//!
//! - [`ErrorLocation`]: call-site tracking embedded in every error variant
//! - [`HttpStatusCode`]: status categorization for the HTTP collaborators
//! - [`RedactedSecret`]: credentials that must never reach a log line

pub mod error;
pub mod http_status;
pub mod redacted_secret;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;
