//! The predicate language.
//!
//! An [`Expression`] maps operator names to operands. `$f` scopes nested
//! expressions to dotted field paths; `$eq`, `$gt`, `$gte`, `$lt` and `$lte`
//! compare the scoped value against a scalar. An [`Evaluator`] owns the
//! [`OperatorTable`] and the alias scheme used for field resolution.

pub mod evaluator;
pub mod expression;
pub mod field;
pub mod operators;

pub use evaluator::Evaluator;
pub use expression::Expression;
pub use field::resolve;
pub use operators::{Operator, OperatorFn, OperatorTable};
