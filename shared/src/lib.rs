//! AuthGate Shared Library
//!
//! Wire types, the authentication error taxonomy and input validation
//! shared between the backend and any client of the auth API.

pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
