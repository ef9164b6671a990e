// 缓存模块
// 本地键值存储、缓存键与缓存数据结构

pub mod keys;
pub mod models;
pub mod store;

pub use models::{CachedLocation, CachedSession};
pub use store::{KeyValueStore, MemoryStore, RedisStore, read_json, write_json};
