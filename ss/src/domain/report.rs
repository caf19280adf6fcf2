//! Pipeline output and the static loyalty-program summary shown alongside it

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::Region;

/// A retailer loyalty program shown with every report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoyaltyProgram {
    pub name: &'static str,
    pub summary: &'static str,
}

/// Loyalty programs of the major retailers
pub const LOYALTY_PROGRAMS: &[LoyaltyProgram] = &[
    LoyaltyProgram {
        name: "Checkers Xtra Savings",
        summary: "Current specials and personalized discounts",
    },
    LoyaltyProgram {
        name: "Pick n Pay Smart Shopper",
        summary: "Points and personalized discounts",
    },
    LoyaltyProgram {
        name: "Woolworths WRewards",
        summary: "Member pricing and special offers",
    },
    LoyaltyProgram {
        name: "Makro mCard",
        summary: "Bulk buying benefits and special pricing",
    },
];

/// Render the loyalty summary as a markdown bullet list
pub fn loyalty_markdown() -> String {
    LOYALTY_PROGRAMS
        .iter()
        .map(|p| format!("- **{}**: {}", p.name, p.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The three artifacts of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingReport {
    /// Items the run was produced for, in list order
    pub items: Vec<String>,
    /// Display label only
    pub region: Region,
    /// Per-item search blocks joined by the separator
    pub raw_prices: String,
    /// Analyzer output
    pub analysis: String,
    /// Recommender output
    pub plan: String,
    pub generated_at: DateTime<Utc>,
}

impl ShoppingReport {
    /// Render the full report as markdown (plan first, then loyalty, analysis, raw data)
    pub fn to_markdown(&self) -> String {
        debug!(items = self.items.len(), %self.region, "ShoppingReport::to_markdown: called");
        let mut out = String::new();
        out.push_str(&format!("# Shopping Analysis for {}\n\n", self.region));
        out.push_str("## Recommended Shopping Plan\n\n");
        out.push_str("> Prices shown include standard loyalty program discounts where applicable\n\n");
        out.push_str(self.plan.trim_end());
        out.push_str("\n\n## Loyalty Program Benefits\n\n");
        out.push_str(&loyalty_markdown());
        out.push_str("\n\n## Price Analysis\n\n");
        out.push_str(self.analysis.trim_end());
        out.push_str("\n\n## Raw Price Data\n\n");
        out.push_str(self.raw_prices.trim_end());
        out.push('\n');
        out
    }
}
