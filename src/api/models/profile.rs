use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 用户资料（球员或场馆方）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// 表中其他字段原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            email: None,
            phone: None,
            avatar_url: None,
            extra: Map::new(),
        }
    }
}
