//! Expression and placeholder assembly.
//!
//! Pure functions, no I/O. Every builder returns the expression string
//! together with the `#name` and `:value` placeholder maps it references.

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::dynamodb::Item;
use crate::error::{Error, Result};

/// An expression string plus the placeholders it uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl Expression {
    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }
}

/// Relational operator used by [`conjunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" => Ok(Comparison::Eq),
            "<" => Ok(Comparison::Lt),
            "<=" => Ok(Comparison::Le),
            ">" => Ok(Comparison::Gt),
            ">=" => Ok(Comparison::Ge),
            other => Err(Error::InvalidOperator(other.to_string())),
        }
    }
}

/// Builds `SET #attr0 = :val0, #attr1 = :val1, ...` over every attribute of
/// `item` that is not one of `key_fields`.
///
/// Attributes are visited in name order so the expression is stable.
pub fn update_expression(item: &Item, key_fields: &[&str]) -> Result<Expression> {
    let mut fields: Vec<(&String, &AttributeValue)> = item
        .attributes
        .iter()
        .filter(|(name, _)| !key_fields.contains(&name.as_str()))
        .collect();

    if fields.is_empty() {
        return Err(Error::NoFieldsToUpdate);
    }
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut assignments = Vec::with_capacity(fields.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (i, (attr_name, attr_value)) in fields.into_iter().enumerate() {
        let placeholder = format!("#attr{}", i);
        let value_placeholder = format!(":val{}", i);

        assignments.push(format!("{} = {}", placeholder, value_placeholder));
        names.insert(placeholder, attr_name.clone());
        values.insert(value_placeholder, attr_value.clone());
    }

    Ok(Expression {
        expression: format!("SET {}", assignments.join(", ")),
        names,
        values,
    })
}

/// `#pk = :pk`, used as a key condition.
pub fn key_equals(partition_key: &str, value: AttributeValue) -> Expression {
    Expression {
        expression: "#pk = :pk".to_string(),
        names: HashMap::from([("#pk".to_string(), partition_key.to_string())]),
        values: HashMap::from([(":pk".to_string(), value)]),
    }
}

/// `#field = :value`, used as a scan filter.
pub fn field_equals(field: &str, value: AttributeValue) -> Expression {
    Expression {
        expression: "#field = :value".to_string(),
        names: HashMap::from([("#field".to_string(), field.to_string())]),
        values: HashMap::from([(":value".to_string(), value)]),
    }
}

/// `#field BETWEEN :start AND :end`. Both bounds are inclusive.
///
/// Each bound must be a finite number (`N`). The number text is kept as
/// marshalled, so large integers are not rounded.
pub fn between(field: &str, start: AttributeValue, end: AttributeValue) -> Result<Expression> {
    for bound in [&start, &end] {
        if !is_finite_number(bound) {
            return Err(Error::UnsupportedValue {
                field: field.to_string(),
            });
        }
    }

    Ok(Expression {
        expression: "#field BETWEEN :start AND :end".to_string(),
        names: HashMap::from([("#field".to_string(), field.to_string())]),
        values: HashMap::from([(":start".to_string(), start), (":end".to_string(), end)]),
    })
}

fn is_finite_number(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::N(n) => n.parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

/// Joins one comparison per field with `AND`.
///
/// Every field in `values` needs an entry in `operators`, and every value must
/// be a string or a number. Both are checked before anything is built. An
/// empty `values` map yields an empty expression.
pub fn conjunction(
    values: &HashMap<String, AttributeValue>,
    operators: &HashMap<String, Comparison>,
) -> Result<Expression> {
    let mut fields: Vec<&String> = values.keys().collect();
    fields.sort();

    for field in &fields {
        if !operators.contains_key(*field) {
            return Err(Error::MissingOperator {
                field: field.to_string(),
            });
        }
        if !matches!(values[*field], AttributeValue::S(_) | AttributeValue::N(_)) {
            return Err(Error::UnsupportedValue {
                field: field.to_string(),
            });
        }
    }

    let mut clauses = Vec::with_capacity(fields.len());
    let mut expression = Expression::default();

    for (i, field) in fields.into_iter().enumerate() {
        let placeholder = format!("#attr{}", i);
        let value_placeholder = format!(":val{}", i);

        clauses.push(format!(
            "{} {} {}",
            placeholder, operators[field], value_placeholder
        ));
        expression.names.insert(placeholder, field.clone());
        expression
            .values
            .insert(value_placeholder, values[field].clone());
    }

    expression.expression = clauses.join(" AND ");
    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_string())
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_string())
    }

    #[test]
    fn update_covers_only_non_key_fields() {
        let item = Item::new().set_string("id", "1").set_string("name", "a");

        let expr = update_expression(&item, &["id"]).unwrap();

        assert_eq!(expr.expression, "SET #attr0 = :val0");
        assert_eq!(expr.names, HashMap::from([("#attr0".to_string(), "name".to_string())]));
        assert_eq!(expr.values, HashMap::from([(":val0".to_string(), s("a"))]));
    }

    #[test]
    fn update_skips_sort_key_and_orders_fields() {
        let item = Item::new()
            .set_string("category", "Books")
            .set_string("product_name", "Dune")
            .set_number("price", 9.5)
            .set_string("author", "Herbert");

        let expr = update_expression(&item, &["category", "product_name"]).unwrap();

        assert_eq!(expr.expression, "SET #attr0 = :val0, #attr1 = :val1");
        assert_eq!(expr.names["#attr0"], "author");
        assert_eq!(expr.names["#attr1"], "price");
        assert_eq!(expr.values[":val1"], n("9.5"));
    }

    #[test]
    fn update_with_only_keys_is_rejected() {
        let item = Item::new().set_string("id", "1").set_string("sk", "x");

        let err = update_expression(&item, &["id", "sk"]).unwrap_err();
        assert!(matches!(err, Error::NoFieldsToUpdate));
        assert_eq!(err.to_string(), "No fields to update");
    }

    #[test]
    fn comparison_symbols_parse() {
        for op in ["=", "<", "<=", ">", ">="] {
            let parsed: Comparison = op.parse().unwrap();
            assert_eq!(parsed.symbol(), op);
        }
        assert!(matches!(
            "<>".parse::<Comparison>(),
            Err(Error::InvalidOperator(op)) if op == "<>"
        ));
    }

    #[test]
    fn conjunction_joins_clauses_in_field_order() {
        let values = HashMap::from([
            ("price".to_string(), n("10")),
            ("category".to_string(), s("Books")),
        ]);
        let operators = HashMap::from([
            ("price".to_string(), Comparison::Ge),
            ("category".to_string(), Comparison::Eq),
        ]);

        let expr = conjunction(&values, &operators).unwrap();

        assert_eq!(expr.expression, "#attr0 = :val0 AND #attr1 >= :val1");
        assert_eq!(expr.names["#attr0"], "category");
        assert_eq!(expr.names["#attr1"], "price");
        assert_eq!(expr.values[":val0"], s("Books"));
        assert_eq!(expr.values[":val1"], n("10"));
    }

    #[test]
    fn conjunction_requires_an_operator_per_field() {
        let values = HashMap::from([("price".to_string(), n("10"))]);

        let err = conjunction(&values, &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingOperator { field } if field == "price"));
    }

    #[test]
    fn conjunction_rejects_non_scalar_values() {
        let nested = AttributeValue::M(HashMap::from([("a".to_string(), s("b"))]));
        let values = HashMap::from([("meta".to_string(), nested)]);
        let operators = HashMap::from([("meta".to_string(), Comparison::Eq)]);

        let err = conjunction(&values, &operators).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { field } if field == "meta"));
    }

    #[test]
    fn between_is_inclusive_numeric_range() {
        let expr = between("price", n("10"), n("20.5")).unwrap();
        assert_eq!(expr.expression, "#field BETWEEN :start AND :end");
        assert_eq!(expr.names["#field"], "price");
        assert_eq!(expr.values[":start"], n("10"));
        assert_eq!(expr.values[":end"], n("20.5"));
    }

    #[test]
    fn between_keeps_large_integers_exact() {
        let expr = between("ts", n("9007199254740993"), n("9007199254740994")).unwrap();
        assert_eq!(expr.values[":start"], n("9007199254740993"));
    }

    #[test]
    fn between_rejects_non_numeric_bounds() {
        for (start, end) in [
            (n("NaN"), n("1")),
            (n("0"), n("inf")),
            (s("a"), n("1")),
            (n("0"), AttributeValue::Bool(true)),
        ] {
            let err = between("price", start, end).unwrap_err();
            assert!(matches!(err, Error::UnsupportedValue { field } if field == "price"));
        }
    }
}
