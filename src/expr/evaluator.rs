//! Expression evaluation against items.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::Value;

use super::expression::Expression;
use super::field;
use super::operators::OperatorTable;

/// Interprets [`Expression`]s using an operator table and an optional alias
/// scheme for field resolution.
///
/// Evaluation is pure and never fails: unknown operators, type mismatches and
/// unresolvable paths are all non-matches.
#[derive(Debug, Clone)]
pub struct Evaluator {
    table: Arc<OperatorTable>,
    alias_key: Option<String>,
}

impl Evaluator {
    /// Creates an evaluator. An empty alias key is treated as none.
    #[must_use]
    pub fn new(table: Arc<OperatorTable>, alias_key: Option<String>) -> Self {
        Self {
            table,
            alias_key: alias_key.filter(|k| !k.is_empty()),
        }
    }

    /// Uses the shared built-in operator table and the given alias scheme.
    #[must_use]
    pub fn with_alias_key(alias_key: impl Into<String>) -> Self {
        Self::new(OperatorTable::shared_standard(), Some(alias_key.into()))
    }

    /// Alias scheme used for field resolution.
    #[must_use]
    pub fn alias_key(&self) -> Option<&str> {
        self.alias_key.as_deref()
    }

    /// The operator table.
    #[must_use]
    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    /// Returns true if every entry of `expr` holds for `item`.
    #[must_use]
    pub fn matches(&self, expr: &Expression, item: &Value) -> bool {
        self.matches_operands(expr.operand_map(), item)
    }

    /// Evaluates a raw operator map against `target`. Operator functions use
    /// this to recurse into nested expressions.
    #[must_use]
    pub fn matches_operands(&self, operands: &BTreeMap<String, Value>, target: &Value) -> bool {
        operands.iter().all(|(op, operand)| {
            self.table
                .get(op)
                .is_some_and(|eval| eval(self, target, operand))
        })
    }

    /// Resolves a field path with this evaluator's alias scheme.
    #[must_use]
    pub fn resolve<'a>(&self, item: &'a Value, path: &str) -> Option<&'a Value> {
        field::resolve(item, path, self.alias_key())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(OperatorTable::shared_standard(), None)
    }
}

impl Expression {
    /// Evaluates this expression with the built-in operators.
    #[must_use]
    pub fn matches(&self, item: &Value, alias_key: Option<&str>) -> bool {
        Evaluator::new(OperatorTable::shared_standard(), alias_key.map(str::to_string))
            .matches(self, item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn msg(age: i64) -> Value {
        let detail = Record::new("Detail").with_aliased("Age", [("json", "age")], age);
        Record::new("Msg")
            .with("Name", "ok")
            .with_aliased("Detail", [("json", "detail")], detail)
            .into()
    }

    fn adult() -> Expression {
        Expression::new()
            .field("Name", Expression::is("ok"))
            .field("Detail.Age", Expression::new().gt(18).lt(31))
    }

    #[test]
    fn empty_expression_matches_everything() {
        let ev = Evaluator::default();
        for item in [Value::Null, Value::Int(1), Value::from("x"), msg(3), Value::map([("a", 1)])] {
            assert!(ev.matches(&Expression::new(), &item));
        }
    }

    #[test]
    fn equals_is_reflexive() {
        let ev = Evaluator::default();
        for item in [Value::Int(7), Value::from("s"), Value::Bool(false), msg(19), Value::Null] {
            assert!(ev.matches(&Expression::is(item.clone()), &item));
        }
    }

    #[test]
    fn equals_is_type_exact() {
        let ev = Evaluator::default();
        assert!(!ev.matches(&Expression::is(18), &Value::Float(18.0)));
        assert!(!ev.matches(&Expression::is(18), &Value::UInt(18)));
        assert!(ev.matches(&Expression::new().gte(18).lte(18), &Value::Float(18.0)));
    }

    #[test]
    fn ordering_operators_normalize_numbers() {
        let ev = Evaluator::default();
        assert!(ev.matches(&Expression::new().gt(18), &Value::Int(19)));
        assert!(!ev.matches(&Expression::new().gt(18), &Value::Int(18)));
        assert!(ev.matches(&Expression::new().gte(18), &Value::Int(18)));
        assert!(ev.matches(&Expression::new().gt(18), &Value::Float(18.5)));
        assert!(ev.matches(&Expression::new().lt(18.5), &Value::from(18u8)));
        assert!(!ev.matches(&Expression::new().gt(18), &Value::from("19")));
        assert!(!ev.matches(&Expression::new().lte(18), &Value::Null));
    }

    #[test]
    fn field_scoped_nested_match() {
        let ev = Evaluator::default();
        assert!(ev.matches(&adult(), &msg(19)));
        assert!(!ev.matches(&adult(), &msg(17)));
        assert!(!ev.matches(&adult(), &msg(31)));
    }

    #[test]
    fn field_scope_over_dictionaries() {
        let ev = Evaluator::default();
        let item = Value::map([("Name", Value::from("ok")), ("Detail", Value::map([("Age", 30)]))]);
        assert!(ev.matches(&adult(), &item));
    }

    #[test]
    fn alias_scheme_applies_to_field_scope() {
        let expr = Expression::from_json_str(
            r#"{"$f":{"Name":{"$eq":"ok"}, "detail.age":{"$gt":18,"$lt":31}}}"#,
        )
        .unwrap();
        assert!(Evaluator::with_alias_key("json").matches(&expr, &msg(22)));
        assert!(!Evaluator::with_alias_key("json").matches(&expr, &msg(18)));
        assert!(!Evaluator::default().matches(&expr, &msg(22)));
        assert!(expr.matches(&msg(22), Some("json")));
    }

    #[test]
    fn missing_field_is_evaluated_as_null() {
        let ev = Evaluator::default();
        let item = Value::map([("a", 1)]);
        assert!(ev.matches(&Expression::new().field("b", Expression::is(Value::Null)), &item));
        assert!(ev.matches(&Expression::new().field("b", Expression::new()), &item));
        assert!(!ev.matches(&Expression::new().field("b", Expression::new().gt(0)), &item));
    }

    #[test]
    fn malformed_expressions_fail_closed() {
        let ev = Evaluator::default();
        let item = msg(19);
        assert!(!ev.matches(&Expression::new().with_op("$gtx", 1), &Value::Int(5)));
        assert!(!ev.matches(&Expression::new().with_op("$f", 3), &item));
        assert!(!ev.matches(
            &Expression::new().with_op("$f", Value::map([("Name", "ok")])),
            &item
        ));
        // An unknown operator poisons the conjunction even if the rest holds.
        assert!(!ev.matches(&adult().with_op("$nope", 1), &item));
    }

    #[test]
    fn evaluation_is_order_independent() {
        let ev = Evaluator::default();
        let a = Expression::new().lt(31).gt(18);
        let b = Expression::new().gt(18).lt(31);
        for v in [17, 19, 31] {
            assert_eq!(ev.matches(&a, &Value::Int(v)), ev.matches(&b, &Value::Int(v)));
        }
    }

    #[test]
    fn injected_operator_table() {
        fn op_ne(_: &Evaluator, target: &Value, operand: &Value) -> bool {
            target != operand
        }
        let table = Arc::new(OperatorTable::standard().with("$ne", op_ne));
        let ev = Evaluator::new(table, None);
        let expr = Expression::new().with_op("$ne", 3).gt(0);
        assert!(ev.matches(&expr, &Value::Int(4)));
        assert!(!ev.matches(&expr, &Value::Int(3)));
        assert!(!Evaluator::default().matches(&expr, &Value::Int(4)));

        let bare = Evaluator::new(Arc::new(OperatorTable::empty()), None);
        assert!(!bare.matches(&Expression::is(1), &Value::Int(1)));
        assert!(bare.matches(&Expression::new(), &Value::Int(1)));
    }
}
