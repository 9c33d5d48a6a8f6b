//! Mango-style selector queries for the in-memory store.
//!
//! Supports the subset of the CouchDB query language that rich queries
//! against account state use in practice:
//!
//! ```json
//! {"selector": {"docType": "account", "balance": {"$lt": 200}}, "limit": 10}
//! ```
//!
//! Field conditions: implicit equality, `$eq`, `$ne`, `$lt`, `$lte`, `$gt`,
//! `$gte`, `$in`, `$nin`, `$exists`. Combinators: `$and`, `$or`, `$nor`,
//! `$not`. Field names may be dotted paths, and a nested object without
//! operators selects on subfields. Anything else is rejected.
//!
//! A missing field only satisfies `{"$exists": false}`. Range operators only
//! match values of the same JSON type as the operand.

use std::cmp::Ordering;

use balance_transfer_common::StoreError;
use serde_json::{Map, Value};

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    selector: Selector,
    limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    And(Vec<Selector>),
    Or(Vec<Selector>),
    Nor(Vec<Selector>),
    Not(Box<Selector>),
    Field { path: Vec<String>, cond: Condition },
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    All(Vec<Condition>),
}

fn invalid(msg: impl Into<String>) -> StoreError {
    StoreError::InvalidQuery(msg.into())
}

impl Query {
    /// Parse a query string.
    pub fn parse(query: &str) -> Result<Self, StoreError> {
        let value: Value =
            serde_json::from_str(query).map_err(|e| invalid(format!("malformed JSON: {e}")))?;
        let Value::Object(top) = value else {
            return Err(invalid("query must be a JSON object"));
        };

        let mut selector = None;
        let mut limit = None;
        for (key, value) in top {
            match key.as_str() {
                "selector" => {
                    let Value::Object(obj) = value else {
                        return Err(invalid("selector must be an object"));
                    };
                    selector = Some(parse_selector(&obj, &[])?);
                }
                "limit" => {
                    let n = value
                        .as_u64()
                        .ok_or_else(|| invalid("limit must be a non-negative integer"))?;
                    limit = Some(usize::try_from(n).unwrap_or(usize::MAX));
                }
                other => return Err(invalid(format!("unsupported query field: {other}"))),
            }
        }

        Ok(Self {
            selector: selector.ok_or_else(|| invalid("missing selector"))?,
            limit,
        })
    }

    /// Maximum number of results, if the query sets one.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Check whether a document satisfies the selector.
    pub fn matches(&self, doc: &Value) -> bool {
        doc.is_object() && self.selector.matches(doc)
    }
}

fn parse_selector(obj: &Map<String, Value>, prefix: &[String]) -> Result<Selector, StoreError> {
    let mut clauses = Vec::with_capacity(obj.len());

    for (key, value) in obj {
        if let Some(op) = key.strip_prefix('$') {
            clauses.push(parse_combinator(op, value, prefix)?);
            continue;
        }

        let mut path = prefix.to_vec();
        path.extend(key.split('.').map(str::to_string));

        match value {
            Value::Object(inner) if has_operator(inner) => {
                clauses.push(Selector::Field {
                    path,
                    cond: parse_condition(inner)?,
                });
            }
            Value::Object(inner) if !inner.is_empty() => {
                clauses.push(parse_selector(inner, &path)?);
            }
            other => clauses.push(Selector::Field {
                path,
                cond: Condition::Eq(other.clone()),
            }),
        }
    }

    Ok(match clauses.len() {
        1 => clauses.remove(0),
        _ => Selector::And(clauses),
    })
}

fn parse_combinator(op: &str, value: &Value, prefix: &[String]) -> Result<Selector, StoreError> {
    match op {
        "and" | "or" | "nor" => {
            let items = value
                .as_array()
                .ok_or_else(|| invalid(format!("${op} requires an array")))?;
            let parts = items
                .iter()
                .map(|item| match item {
                    Value::Object(obj) => parse_selector(obj, prefix),
                    _ => Err(invalid(format!("${op} elements must be objects"))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match op {
                "and" => Selector::And(parts),
                "or" => Selector::Or(parts),
                _ => Selector::Nor(parts),
            })
        }
        "not" => match value {
            Value::Object(obj) => Ok(Selector::Not(Box::new(parse_selector(obj, prefix)?))),
            _ => Err(invalid("$not requires an object")),
        },
        other => Err(invalid(format!("unsupported operator: ${other}"))),
    }
}

fn has_operator(obj: &Map<String, Value>) -> bool {
    obj.keys().any(|k| k.starts_with('$'))
}

fn parse_condition(obj: &Map<String, Value>) -> Result<Condition, StoreError> {
    let mut conds = Vec::with_capacity(obj.len());

    for (op, operand) in obj {
        let cond = match op.as_str() {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$lt" => Condition::Lt(operand.clone()),
            "$lte" => Condition::Lte(operand.clone()),
            "$gt" => Condition::Gt(operand.clone()),
            "$gte" => Condition::Gte(operand.clone()),
            "$in" | "$nin" => {
                let values = operand
                    .as_array()
                    .ok_or_else(|| invalid(format!("{op} requires an array")))?
                    .clone();
                if op == "$in" {
                    Condition::In(values)
                } else {
                    Condition::Nin(values)
                }
            }
            "$exists" => Condition::Exists(
                operand
                    .as_bool()
                    .ok_or_else(|| invalid("$exists requires a boolean"))?,
            ),
            other if other.starts_with('$') => {
                return Err(invalid(format!("unsupported operator: {other}")))
            }
            other => {
                return Err(invalid(format!(
                    "cannot mix operators and field {other} in one condition"
                )))
            }
        };
        conds.push(cond);
    }

    Ok(match conds.len() {
        1 => conds.remove(0),
        _ => Condition::All(conds),
    })
}

impl Selector {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Selector::And(parts) => parts.iter().all(|s| s.matches(doc)),
            Selector::Or(parts) => parts.iter().any(|s| s.matches(doc)),
            Selector::Nor(parts) => !parts.iter().any(|s| s.matches(doc)),
            Selector::Not(inner) => !inner.matches(doc),
            Selector::Field { path, cond } => cond.matches(lookup(doc, path)),
        }
    }
}

fn lookup<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, segment| node.get(segment))
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match (self, field) {
            (Condition::Exists(expected), field) => field.is_some() == *expected,
            (Condition::All(conds), field) => conds.iter().all(|c| c.matches(field)),
            (_, None) => false,
            (Condition::Eq(operand), Some(v)) => same(v, operand),
            (Condition::Ne(operand), Some(v)) => !same(v, operand),
            (Condition::Lt(operand), Some(v)) => ordered(v, operand) == Some(Ordering::Less),
            (Condition::Lte(operand), Some(v)) => {
                matches!(ordered(v, operand), Some(Ordering::Less | Ordering::Equal))
            }
            (Condition::Gt(operand), Some(v)) => ordered(v, operand) == Some(Ordering::Greater),
            (Condition::Gte(operand), Some(v)) => {
                matches!(ordered(v, operand), Some(Ordering::Greater | Ordering::Equal))
            }
            (Condition::In(values), Some(v)) => values.iter().any(|x| same(v, x)),
            (Condition::Nin(values), Some(v)) => !values.iter().any(|x| same(v, x)),
        }
    }
}

fn same(a: &Value, b: &Value) -> bool {
    ordered(a, b) == Some(Ordering::Equal)
}

/// Compare two values of the same JSON type; `None` across types.
fn ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                match ordered(l, r)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        (Value::Object(_), Value::Object(_)) => (a == b).then_some(Ordering::Equal),
        _ => None,
    }
}
