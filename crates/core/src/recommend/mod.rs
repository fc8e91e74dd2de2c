//! Rule mining and complementary product recommendations

mod complementary;
mod rules;
mod types;

pub use complementary::{default_category_relationships, ComplementaryAnalyzer};
pub use rules::AssociationRulesMiner;
pub use types::*;
