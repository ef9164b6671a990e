// 后端数据模型
// 认证、资料与错误响应的数据结构

pub mod auth;
pub mod common;
pub mod profile;

// 重新导出常用类型
pub use auth::*;
pub use common::*;
pub use profile::*;
