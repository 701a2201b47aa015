//! Common types and abstractions
//!
//! Core types shared by every layer:
//! - Stream: unified async I/O abstraction
//! - Error/Result: unified error types

mod stream;

pub use stream::{IntoStream, Stream};

// Re-export error types from crate root
pub use crate::error::{Error, Result};
