/// 缓存键
/// 所有持久化在键值存储里的条目都在这里定义

/// 用户位置缓存键
pub const USER_LOCATION_CACHE_KEY: &str = "user_location_cache";

/// 球员会话缓存键
pub const USER_SESSION_KEY: &str = "user_session";

/// 场馆方（商户）会话缓存键
pub const CLIENT_SESSION_KEY: &str = "client_session";

/// 给键加上命名空间前缀
pub fn namespaced(namespace: &str, key: &str) -> String {
    format!("{}{}", namespace, key)
}
