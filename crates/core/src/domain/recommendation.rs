use serde::{Serialize, Serializer};
use std::fmt;

pub const NO_RECENT_RECOMMENDATIONS: &str = "No recent recommendations";

/// Analyst recommendations exactly as the provider returned them. No schema is enforced; an
/// absent or empty payload becomes an explicit placeholder so prompts always have something
/// stable to interpolate.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationSet {
    Provided(serde_json::Value),
    NoneAvailable,
}

impl RecommendationSet {
    pub fn from_provider(value: Option<serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => Self::NoneAvailable,
            Some(serde_json::Value::Array(a)) if a.is_empty() => Self::NoneAvailable,
            Some(serde_json::Value::Object(o)) if o.is_empty() => Self::NoneAvailable,
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => Self::NoneAvailable,
            Some(v) => Self::Provided(v),
        }
    }
}

impl fmt::Display for RecommendationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provided(serde_json::Value::String(s)) => f.write_str(s),
            Self::Provided(v) => write!(f, "{v}"),
            Self::NoneAvailable => f.write_str(NO_RECENT_RECOMMENDATIONS),
        }
    }
}

impl Serialize for RecommendationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Provided(v) => v.serialize(serializer),
            Self::NoneAvailable => serializer.serialize_str(NO_RECENT_RECOMMENDATIONS),
        }
    }
}
