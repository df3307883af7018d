//! Registrant storage for the waitlist service.
//!
//! A registrant is created once, never mutated and never deleted. Both
//! backends enforce handle uniqueness inside `insert`, so concurrent
//! registrations of the same handle cannot both succeed.

mod error;
mod file;
mod store;
mod types;

pub use error::StoreError;
pub use file::FileStore;
pub use store::{MemoryStore, WaitlistStore};
pub use types::Registrant;
