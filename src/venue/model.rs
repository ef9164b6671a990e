use serde::{Deserialize, Deserializer, Serialize};

use crate::images::ImageSource;
use crate::images::source::deserialize_image_refs;
use crate::utils::Coordinate;

/// 场馆记录，来自后端的只读快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "address", deserialize_with = "null_as_default")]
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    // 每小时价格
    #[serde(default, alias = "price_per_hour", deserialize_with = "null_as_default")]
    pub price: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(
        default,
        alias = "sport",
        alias = "sport_type",
        deserialize_with = "one_or_many"
    )]
    pub sport_types: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_image_refs")]
    pub images: Vec<ImageSource>,
    // 热度由后端提供（如预订次数），这里不推导
    #[serde(default, alias = "booking_count", deserialize_with = "null_as_default")]
    pub popularity: f64,
}

impl Venue {
    pub fn coordinates(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn offers_sport(&self, sport: &str) -> bool {
        self.sport_types.iter().any(|s| s.eq_ignore_ascii_case(sport))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}
