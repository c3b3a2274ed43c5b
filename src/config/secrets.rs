//! Secret handling utilities.
//!
//! Re-exports secrecy types for working with credentials in the
//! mnemo-rs context.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
