//! Authentication module for managing the user session and its persistence.
//!
//! This module provides:
//! - `Session`: the bearer token and user profile, restored at startup
//! - `KeyValueStore`: the persistence capability, with file, memory and
//!   OS keychain backends
//!
//! The token and the profile are persisted under two independent keys.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStore;
pub use session::{Authenticator, Session, UserInfo};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_INFO_KEY};
