//! In-memory session storage.
//!
//! The [`SessionStore`] owns the whole task collection and the single
//! reference to the currently open session, if any.

mod store;

pub use store::{OpenSession, SessionStore};
