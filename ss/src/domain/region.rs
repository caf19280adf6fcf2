//! Region selection
//!
//! The region is a display label for the report header. It is not passed to
//! the search queries or the agent prompts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// South African provinces offered in the region picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "Gauteng")]
    Gauteng,
    #[serde(rename = "Western Cape")]
    WesternCape,
    #[serde(rename = "KwaZulu-Natal")]
    KwaZuluNatal,
    #[serde(rename = "Eastern Cape")]
    EasternCape,
    #[serde(rename = "Free State")]
    FreeState,
    #[serde(rename = "Mpumalanga")]
    Mpumalanga,
    #[serde(rename = "North West")]
    NorthWest,
    #[serde(rename = "Limpopo")]
    Limpopo,
    #[serde(rename = "Northern Cape")]
    NorthernCape,
}

impl Region {
    /// All regions in picker order
    pub const ALL: [Region; 9] = [
        Region::Gauteng,
        Region::WesternCape,
        Region::KwaZuluNatal,
        Region::EasternCape,
        Region::FreeState,
        Region::Mpumalanga,
        Region::NorthWest,
        Region::Limpopo,
        Region::NorthernCape,
    ];

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gauteng => "Gauteng",
            Self::WesternCape => "Western Cape",
            Self::KwaZuluNatal => "KwaZulu-Natal",
            Self::EasternCape => "Eastern Cape",
            Self::FreeState => "Free State",
            Self::Mpumalanga => "Mpumalanga",
            Self::NorthWest => "North West",
            Self::Limpopo => "Limpopo",
            Self::NorthernCape => "Northern Cape",
        }
    }

    /// Position in [`Region::ALL`]
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|r| r == self).unwrap_or(0)
    }

    /// Next region in picker order, wrapping around
    pub fn next(self) -> Self {
        debug!(?self, "Region::next: called");
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous region in picker order, wrapping around
    pub fn prev(self) -> Self {
        debug!(?self, "Region::prev: called");
        let len = Self::ALL.len();
        Self::ALL[(self.index() + len - 1) % len]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Normalize a region name for lenient matching ("kwazulu natal", "western-cape")
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Region::from_str: called");
        let wanted = normalize(s);
        Self::ALL
            .iter()
            .copied()
            .find(|r| normalize(r.name()) == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|r| r.name()).collect();
                format!("Unknown region '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}
