pub mod manager;
pub mod store;

pub use manager::{SessionManager, SessionState, SESSION_COOKIE};
pub use store::{MemorySessionStore, MySqlSessionStore, SessionRecord, SessionStore};
