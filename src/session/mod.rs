//! Session state and lifecycle.
//!
//! This module owns the authenticated state of the client: who the user is,
//! the current credential pair, and whether the process-start bootstrap has
//! resolved yet.

mod manager;
mod models;

pub use manager::SessionManager;
pub use models::{Session, SessionHandle, TokenPair, User, UserRole};
