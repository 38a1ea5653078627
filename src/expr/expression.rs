//! Expression trees.

use std::collections::BTreeMap;

use crate::error::{RouterResult, ValidationError};
use crate::value::Value;

use super::operators::Operator;

/// A conjunctive predicate: a mapping from operator name to operand.
///
/// Every entry must hold for the expression to match; the empty expression
/// matches everything. The `$f` operand is itself a mapping from field path to
/// nested expression.
///
/// # Examples
///
/// ```
/// use matchcast::Expression;
///
/// // {"$f": {"Name": {"$eq": "ok"}, "Detail.Age": {"$gt": 18, "$lt": 31}}}
/// let expr = Expression::new()
///     .field("Name", Expression::is("ok"))
///     .field("Detail.Age", Expression::new().gt(18).lt(31));
///
/// let decoded = Expression::from_json_str(
///     r#"{"$f":{"Name":{"$eq":"ok"},"Detail.Age":{"$gt":18,"$lt":31}}}"#,
/// )
/// .unwrap();
/// assert_eq!(expr, decoded);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    operands: BTreeMap<String, Value>,
}

impl Expression {
    /// The empty expression. It matches every item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `{"$eq": value}`.
    #[must_use]
    pub fn is(value: impl Into<Value>) -> Self {
        Self::new().equals(value)
    }

    /// Adds `$eq`.
    #[must_use]
    pub fn equals(self, value: impl Into<Value>) -> Self {
        self.with_op(Operator::Eq.as_str(), value)
    }

    /// Adds `$gt`.
    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.with_op(Operator::Gt.as_str(), value)
    }

    /// Adds `$gte`.
    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.with_op(Operator::Gte.as_str(), value)
    }

    /// Adds `$lt`.
    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.with_op(Operator::Lt.as_str(), value)
    }

    /// Adds `$lte`.
    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.with_op(Operator::Lte.as_str(), value)
    }

    /// Scopes `sub` to the value at `path`.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, sub: Self) -> Self {
        let scope = self
            .operands
            .entry(Operator::Field.as_str().to_string())
            .or_insert_with(|| Value::Map(BTreeMap::new()));
        if !scope.is_map() {
            *scope = Value::Map(BTreeMap::new());
        }
        if let Value::Map(fields) = scope {
            fields.insert(path.into(), sub.into());
        }
        self
    }

    /// Sets an arbitrary operator entry. Names unknown to the evaluator's
    /// operator table never match.
    #[must_use]
    pub fn with_op(mut self, op: impl Into<String>, operand: impl Into<Value>) -> Self {
        self.operands.insert(op.into(), operand.into());
        self
    }

    /// Parses a JSON document such as `{"$gt": 18}`.
    pub fn from_json_str(s: &str) -> RouterResult<Self> {
        let json: serde_json::Value =
            serde_json::from_str(s).map_err(|e| ValidationError::InvalidExpression {
                reason: e.to_string(),
            })?;
        Ok(Self::try_from(json)?)
    }

    /// Operand stored under `op`.
    #[must_use]
    pub fn operand(&self, op: &str) -> Option<&Value> {
        self.operands.get(op)
    }

    /// All entries in operator-name order.
    pub fn operands(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.operands.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// An empty expression matches every item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    pub(crate) const fn operand_map(&self) -> &BTreeMap<String, Value> {
        &self.operands
    }
}

impl From<Expression> for Value {
    fn from(expr: Expression) -> Self {
        Self::Map(expr.operands)
    }
}

/// Only the root must be a map; nested shapes are checked at evaluation time
/// and fail closed there.
impl TryFrom<Value> for Expression {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(operands) => Ok(Self { operands }),
            other => Err(ValidationError::InvalidExpression {
                reason: format!("expression must be a map, got {}", other.type_name()),
            }),
        }
    }
}

impl TryFrom<serde_json::Value> for Expression {
    type Error = ValidationError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Self::try_from(Value::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_shapes() {
        let expr = Expression::new().gt(18).lt(31);
        assert_eq!(expr.len(), 2);
        assert_eq!(expr.operand("$gt"), Some(&Value::Int(18)));

        let scoped = Expression::new()
            .field("a", Expression::is(1))
            .field("b.c", Expression::new());
        let fields = scoped.operand("$f").and_then(Value::as_map).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("a"), Some(&Value::map([("$eq", 1)])));
    }

    #[test]
    fn test_field_replaces_malformed_scope() {
        let expr = Expression::new().with_op("$f", 3).field("a", Expression::is(1));
        assert!(expr.operand("$f").is_some_and(Value::is_map));
    }

    #[test]
    fn test_json_decoding() {
        let expr = Expression::from_json_str(r#"{"$gt": 13}"#).unwrap();
        assert_eq!(expr, Expression::new().gt(13));

        let err = Expression::from_json_str("[1, 2]").unwrap_err();
        assert!(err.is_validation());
        assert!(Expression::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_empty_expression() {
        assert!(Expression::new().is_empty());
        assert_eq!(Value::from(Expression::new()), Value::Map(BTreeMap::new()));
    }
}
