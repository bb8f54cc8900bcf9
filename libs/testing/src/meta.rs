//! Scenario metadata and tag-based selection.
//!
//! Each scenario carries two tags:
//! - `type`: its category (`smoke`, `positive`, `negative`)
//! - `net`: whether it needs network access to the server (`yes`, `no`)
//!
//! A [`TagFilter`] such as `type=smoke,net=no` selects scenarios whose tags
//! match every named key. Repeating a key accepts any of its values.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Scenario category (`type` tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Smoke,
    Positive,
    Negative,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smoke" => Ok(Self::Smoke),
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            other => Err(TagError::InvalidValue {
                key: "type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Whether a scenario needs network access to the server (`net` tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkRequirement {
    Yes,
    No,
}

impl NetworkRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl fmt::Display for NetworkRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkRequirement {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" | "true" => Ok(Self::Yes),
            "no" | "false" => Ok(Self::No),
            other => Err(TagError::InvalidValue {
                key: "net".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// One row of the scenario table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestMeta {
    /// Unique scenario name, `suite::scenario`.
    pub name: &'static str,
    pub category: Category,
    pub network: NetworkRequirement,
    pub summary: &'static str,
}

/// Invalid tag filter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("expected key=value, got {0:?}")]
    Malformed(String),

    #[error("unknown tag {0:?} (expected type or net)")]
    UnknownKey(String),

    #[error("invalid value {value:?} for tag {key}")]
    InvalidValue { key: String, value: String },
}

/// Selection over scenario tags. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    categories: BTreeSet<Category>,
    network: BTreeSet<NetworkRequirement>,
}

impl TagFilter {
    /// Matches every scenario.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, meta: &TestMeta) -> bool {
        (self.categories.is_empty() || self.categories.contains(&meta.category))
            && (self.network.is_empty() || self.network.contains(&meta.network))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.network.is_empty()
    }
}

impl FromStr for TagFilter {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = Self::default();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| TagError::Malformed(part.to_string()))?;
            match key.trim() {
                "type" => {
                    filter.categories.insert(value.trim().parse()?);
                }
                "net" => {
                    filter.network.insert(value.trim().parse()?);
                }
                other => return Err(TagError::UnknownKey(other.to_string())),
            }
        }

        Ok(filter)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .categories
            .iter()
            .map(|c| format!("type={c}"))
            .chain(self.network.iter().map(|n| format!("net={n}")))
            .collect();
        f.write_str(&parts.join(","))
    }
}
