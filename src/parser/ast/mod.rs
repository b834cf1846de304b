mod expression;
mod statement;

pub use expression::*;
pub use statement::*;
