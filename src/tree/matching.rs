//! Query style matching
//!
//! Criteria are written as JSON, in the style of document databases:
//!
//! ```text
//! {"age": {"$gte": 18}, "name": {"$reg": "^A"}, "tags": {"$contains": "x"}}
//! {"$or": [{"$lt": 0}, {"$gt": 100}]}
//! ```
//!
//! Matching never fails: a comparison that cannot be made counts as a miss.

use super::{Body, NodeId, Tree};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::pattern;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A parsed match expression
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// Plain equality; sequences compare item by item
    Value(Value),
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
    Not(Box<Criteria>),
    /// Regular expression anchored at the start of a string
    Reg(String),
    /// Some item of a sequence matches
    Contains(Box<Criteria>),
    /// Each named field matches
    Fields(BTreeMap<String, Criteria>),
}

impl Criteria {
    pub fn from_json(json: &serde_json::Value) -> SchemaResult<Criteria> {
        let serde_json::Value::Object(map) = json else {
            return Ok(Criteria::Value(Value::from_json(json)));
        };
        if map.is_empty() {
            return Ok(Criteria::Value(Value::Map(BTreeMap::new())));
        }
        let operators = map.keys().filter(|k| k.starts_with('$')).count();
        if operators == 0 {
            return map
                .iter()
                .map(|(key, sub)| Ok((key.clone(), Criteria::from_json(sub)?)))
                .collect::<SchemaResult<BTreeMap<_, _>>>()
                .map(Criteria::Fields);
        }
        if operators != map.len() {
            return Err(SchemaError::syntax("cannot mix operators and fields", "")
                .with("criteria", Value::from_json(json)));
        }
        let mut parsed = map
            .iter()
            .map(|(op, arg)| Criteria::operator(op, arg))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(if parsed.len() == 1 {
            parsed.remove(0)
        } else {
            Criteria::And(parsed)
        })
    }

    pub fn parse(text: &str) -> SchemaResult<Criteria> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Criteria::from_json(&json)
    }

    fn operator(op: &str, arg: &serde_json::Value) -> SchemaResult<Criteria> {
        let literal = || Value::from_json(arg);
        let list = || -> SchemaResult<Vec<Criteria>> {
            match arg {
                serde_json::Value::Array(items) => items.iter().map(Criteria::from_json).collect(),
                _ => Err(SchemaError::syntax(format!("{op} needs a list"), "")),
            }
        };
        Ok(match op {
            "$eq" => Criteria::Eq(literal()),
            "$ne" => Criteria::Ne(literal()),
            "$gt" => Criteria::Gt(literal()),
            "$gte" => Criteria::Gte(literal()),
            "$lt" => Criteria::Lt(literal()),
            "$lte" => Criteria::Lte(literal()),
            "$and" => Criteria::And(list()?),
            "$or" => Criteria::Or(list()?),
            "$not" => Criteria::Not(Box::new(Criteria::from_json(arg)?)),
            "$contains" => Criteria::Contains(Box::new(Criteria::from_json(arg)?)),
            "$reg" => match arg.as_str() {
                Some(p) => Criteria::Reg(p.to_string()),
                None => return Err(SchemaError::syntax("$reg needs a string", "")),
            },
            other => {
                return Err(SchemaError::syntax("operator unknown", "").with("operator", other))
            }
        })
    }
}

impl Tree {
    pub fn matches(&self, id: NodeId, criteria: &Criteria) -> bool {
        self.eval(id, criteria).unwrap_or(false)
    }

    fn eval(&self, id: NodeId, criteria: &Criteria) -> SchemaResult<bool> {
        let node = self.data(id)?;
        let value = self.value(id);
        let order = |other: &Value| {
            value.partial_cmp(other).ok_or_else(|| {
                SchemaError::type_mismatch("values cannot be ordered", self.path_name(id))
            })
        };
        Ok(match criteria {
            Criteria::Value(expected) => match (&node.body, expected) {
                (Body::Items(Some(ids)), Value::List(items) | Value::Tuple(items)) => {
                    ids.len() == items.len()
                        && ids
                            .iter()
                            .zip(items)
                            .all(|(child, item)| self.matches(*child, &Criteria::Value(item.clone())))
                }
                _ => value == *expected,
            },
            Criteria::Eq(expected) => value == *expected,
            Criteria::Ne(expected) => value != *expected,
            Criteria::Gt(bound) => order(bound)? == Ordering::Greater,
            Criteria::Gte(bound) => order(bound)? != Ordering::Less,
            Criteria::Lt(bound) => order(bound)? == Ordering::Less,
            Criteria::Lte(bound) => order(bound)? != Ordering::Greater,
            Criteria::And(all) => all.iter().all(|c| self.matches(id, c)),
            Criteria::Or(any) => any.iter().any(|c| self.matches(id, c)),
            Criteria::Not(inner) => !self.matches(id, inner),
            Criteria::Reg(regexp) => {
                let text = value.as_str().ok_or_else(|| {
                    SchemaError::type_mismatch("Must be a string", self.path_name(id))
                })?;
                pattern::matches_start(regexp, text)?
            }
            Criteria::Contains(inner) => match &node.body {
                Body::Items(None) => false,
                Body::Items(Some(ids)) => ids.iter().any(|child| self.matches(*child, inner)),
                _ => {
                    return Err(SchemaError::type_mismatch("Must be a list", self.path_name(id)))
                }
            },
            Criteria::Fields(fields) => {
                if !matches!(node.body, Body::Fields(_)) {
                    return Err(SchemaError::type_mismatch("Must be a dict", self.path_name(id)));
                }
                fields.iter().all(|(key, sub)| {
                    self.get(id, key).map_or(false, |child| self.matches(child, sub))
                })
            }
        })
    }
}
