/// 登录会话
pub mod session;

pub use session::{AccountKind, SessionManager};
