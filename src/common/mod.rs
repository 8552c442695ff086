//! Common types, traits, and error definitions for tangent_bug
//!
//! This module provides the geometry kernel, the error type and the
//! vehicle boundary shared by the mapping and navigation modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
