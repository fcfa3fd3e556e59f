use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Aspect ratios accepted by the image edit node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Wide,
    Tall,
    Portrait,
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
        }
    }

    /// Unknown values fall back to 16:9 instead of failing.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "16:9" => AspectRatio::Wide,
            "9:16" => AspectRatio::Tall,
            "3:4" => AspectRatio::Portrait,
            "4:3" => AspectRatio::Landscape,
            other => {
                tracing::debug!("Unsupported aspect ratio '{}', using 16:9", other);
                AspectRatio::Wide
            }
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AspectRatio::parse_lenient(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerated_values_map_to_themselves() {
        for raw in ["16:9", "9:16", "3:4", "4:3"] {
            assert_eq!(AspectRatio::parse_lenient(raw).as_str(), raw);
        }
    }

    #[test]
    fn unknown_values_fall_back_to_wide() {
        assert_eq!(AspectRatio::parse_lenient("21:9"), AspectRatio::Wide);
        assert_eq!(AspectRatio::parse_lenient(""), AspectRatio::Wide);
        let parsed: AspectRatio = serde_json::from_str("\"square\"").unwrap();
        assert_eq!(parsed.as_str(), "16:9");
    }
}
