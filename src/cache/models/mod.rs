/// 缓存数据模型
pub mod location;
pub mod session;

pub use location::CachedLocation;
pub use session::CachedSession;
