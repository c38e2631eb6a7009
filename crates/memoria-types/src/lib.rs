//! Shared types and error hierarchy for Memoria.

pub mod error;
pub mod message;
pub mod provider;
pub mod util;

pub use error::{ConfigError, ProviderError};
pub use message::*;
pub use provider::{DeltaSink, GenerateFuture, TextGenerator};
pub use util::{preview_str, truncate_str};
