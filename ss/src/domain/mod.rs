//! Domain types: the shopping list, region labels and the pipeline report

mod region;
mod report;
mod shopping_list;

pub use region::Region;
pub use report::{LOYALTY_PROGRAMS, LoyaltyProgram, ShoppingReport, loyalty_markdown};
pub use shopping_list::ShoppingList;
