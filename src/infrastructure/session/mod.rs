mod memory_store;
mod redis_store;

pub use memory_store::MemorySessionStore;
pub use redis_store::{create_redis_session_store, RedisSessionStore};
