//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Searcher agent instructions
pub const SEARCHER: &str = include_str!("../../prompts/searcher.pmt");

/// Analyzer agent instructions
pub const ANALYZER: &str = include_str!("../../prompts/analyzer.pmt");

/// Recommender agent instructions
pub const RECOMMENDER: &str = include_str!("../../prompts/recommender.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "searcher" => Some(SEARCHER),
        "analyzer" => Some(ANALYZER),
        "recommender" => Some(RECOMMENDER),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
