use serde::{Deserialize, Deserializer, Serialize};

/// 图片来源，在构造处确定类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    Remote { uri: String },
    Bundled { path: String },
}

impl ImageSource {
    pub fn remote(uri: impl Into<String>) -> Self {
        ImageSource::Remote { uri: uri.into() }
    }

    pub fn bundled(path: impl Into<String>) -> Self {
        ImageSource::Bundled { path: path.into() }
    }

    pub fn location(&self) -> &str {
        match self {
            ImageSource::Remote { uri } => uri,
            ImageSource::Bundled { path } => path,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ImageSource::Remote { .. })
    }
}

// 后端的图片字段可能是字符串，也可能是 {uri} 对象
#[derive(Deserialize)]
#[serde(untagged)]
enum RawImageRef {
    Tagged(ImageSource),
    Uri(String),
    Object { uri: String },
}

impl From<RawImageRef> for ImageSource {
    fn from(raw: RawImageRef) -> Self {
        match raw {
            RawImageRef::Tagged(source) => source,
            RawImageRef::Uri(uri) | RawImageRef::Object { uri } => ImageSource::remote(uri),
        }
    }
}

/// 反序列化图片列表，空地址被丢弃
pub fn deserialize_image_refs<'de, D>(deserializer: D) -> Result<Vec<ImageSource>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawImageRef>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(ImageSource::from)
        .filter(|source| !source.location().trim().is_empty())
        .collect())
}
