//! Access-token lifecycle: storage backends and the credential manager.

pub mod manager;
#[cfg(feature = "redis-store")]
pub mod redis;
pub mod store;

pub use manager::{CredentialManager, IssuedAppToken, IssuedToken, TokenKind};
#[cfg(feature = "redis-store")]
pub use redis::RedisStore;
pub use store::{MemoryStore, TokenStore};
