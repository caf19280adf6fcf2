//! Prompt Template System
//!
//! Loads and renders the `.pmt` instruction templates for the three agents.
//!
//! Template loading chain:
//! 1. `.smartshopper/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (working directory default)
//! 3. Embedded fallback compiled into the binary
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
