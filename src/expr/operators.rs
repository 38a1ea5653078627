//! Operator table, the built-in operators and numeric normalization.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::error::ValidationError;
use crate::value::Value;

use super::evaluator::Evaluator;
use super::field::resolve;

/// The built-in operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `$f`: scope sub-expressions to field paths.
    Field,
    /// `$eq`: exact structural equality.
    Eq,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
}

impl Operator {
    /// Every built-in operator.
    pub const ALL: [Self; 6] = [Self::Field, Self::Eq, Self::Gt, Self::Gte, Self::Lt, Self::Lte];

    /// Name as written in an expression.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Field => "$f",
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }

    fn eval_fn(self) -> OperatorFn {
        match self {
            Self::Field => op_field,
            Self::Eq => op_eq,
            Self::Gt => op_gt,
            Self::Gte => op_gte,
            Self::Lt => op_lt,
            Self::Lte => op_lte,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidExpression {
                reason: format!("unknown operator '{s}'"),
            })
    }
}

/// Evaluates one operator entry: `(evaluator, target, operand) -> matched`.
///
/// Operator functions must be pure and must not panic on unexpected shapes;
/// anything they cannot evaluate is a non-match.
pub type OperatorFn = fn(&Evaluator, &Value, &Value) -> bool;

/// Immutable mapping from operator name to evaluation function.
///
/// Build one with [`OperatorTable::standard`] (optionally extended with
/// [`with`](Self::with)) and hand it to an [`Evaluator`]. Names not present in
/// the table evaluate to false.
#[derive(Clone)]
pub struct OperatorTable {
    ops: HashMap<String, OperatorFn>,
}

static STANDARD: OnceLock<Arc<OperatorTable>> = OnceLock::new();

impl OperatorTable {
    /// A table with no operators. Every non-empty expression fails against it.
    #[must_use]
    pub fn empty() -> Self {
        Self { ops: HashMap::new() }
    }

    /// A table holding the built-in operators.
    #[must_use]
    pub fn standard() -> Self {
        Operator::ALL
            .into_iter()
            .fold(Self::empty(), |table, op| table.with(op.as_str(), op.eval_fn()))
    }

    /// Shared instance of [`standard`](Self::standard), built once.
    #[must_use]
    pub fn shared_standard() -> Arc<Self> {
        Arc::clone(STANDARD.get_or_init(|| Arc::new(Self::standard())))
    }

    /// Adds or replaces an operator.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, f: OperatorFn) -> Self {
        self.ops.insert(name.into(), f);
        self
    }

    /// Looks up an operator by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<OperatorFn> {
        self.ops.get(name).copied()
    }

    /// Whether an operator named `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Number of operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the table has no operators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.ops.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("OperatorTable").field("ops", &names).finish()
    }
}

/// A value after numeric normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integral value.
    Int(i64),
    /// Floating point value.
    Float(f64),
}

/// Normalizes a value for the ordering operators.
///
/// Signed integers stay as they are; unsigned integers are cast to i64;
/// floats stay f64; timestamps become epoch seconds. Anything else is not a
/// number.
#[allow(clippy::cast_possible_wrap)]
#[must_use]
pub fn normalize(v: &Value) -> Option<Number> {
    match v {
        Value::Int(i) => Some(Number::Int(*i)),
        Value::UInt(u) => Some(Number::Int(*u as i64)),
        Value::Float(f) => Some(Number::Float(*f)),
        Value::Timestamp(t) => Some(Number::Int(t.timestamp())),
        _ => None,
    }
}

/// Orders `target` against `operand` after normalization. Mixed int/float
/// pairs compare as floats. `None` if either side is not a number or a float
/// is NaN.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn compare(target: &Value, operand: &Value) -> Option<Ordering> {
    match (normalize(target)?, normalize(operand)?) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (Number::Int(a), Number::Float(b)) => (a as f64).partial_cmp(&b),
        (Number::Float(a), Number::Int(b)) => a.partial_cmp(&(b as f64)),
        (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
    }
}

static NULL: Value = Value::Null;

fn op_field(ev: &Evaluator, target: &Value, operand: &Value) -> bool {
    let Value::Map(fields) = operand else {
        return false;
    };
    fields.iter().all(|(path, sub)| {
        let Value::Map(sub) = sub else {
            return false;
        };
        let resolved = resolve(target, path, ev.alias_key()).unwrap_or(&NULL);
        ev.matches_operands(sub, resolved)
    })
}

fn op_eq(_: &Evaluator, target: &Value, operand: &Value) -> bool {
    target == operand
}

fn op_gt(_: &Evaluator, target: &Value, operand: &Value) -> bool {
    compare(target, operand) == Some(Ordering::Greater)
}

fn op_gte(_: &Evaluator, target: &Value, operand: &Value) -> bool {
    matches!(compare(target, operand), Some(Ordering::Greater | Ordering::Equal))
}

fn op_lt(_: &Evaluator, target: &Value, operand: &Value) -> bool {
    compare(target, operand) == Some(Ordering::Less)
}

fn op_lte(_: &Evaluator, target: &Value, operand: &Value) -> bool {
    matches!(compare(target, operand), Some(Ordering::Less | Ordering::Equal))
}
