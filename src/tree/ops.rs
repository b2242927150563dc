//! Arithmetic and comparison on nodes
//!
//! Binary operators never touch the left operand: the result is checked
//! and committed into a detached copy of it, so `tree.add(a, &1.into())`
//! yields a new tree holding `a + 1` with all of `a`'s constraints applied.

use super::{Body, NodeId, Origin, Tree};
use crate::error::SchemaResult;
use crate::value::{BinaryOp, Value};
use std::cmp::Ordering;

macro_rules! binary_methods {
    ($($name:ident => $op:ident),* $(,)?) => {
        impl Tree {
            $(
                pub fn $name(&self, id: NodeId, rhs: &Value) -> SchemaResult<Tree> {
                    self.binary(id, BinaryOp::$op, rhs)
                }
            )*
        }
    };
}

binary_methods! {
    add => Add,
    sub => Sub,
    mul => Mul,
    div => Div,
    floor_div => FloorDiv,
    rem => Rem,
    pow => Pow,
    shl => Shl,
    shr => Shr,
    bitand => BitAnd,
    bitor => BitOr,
    bitxor => BitXor,
}

impl Tree {
    pub fn binary(&self, id: NodeId, op: BinaryOp, rhs: &Value) -> SchemaResult<Tree> {
        let path = self.path_name(id);
        let result = self.value(id).apply(op, rhs).map_err(|e| e.at(path))?;
        let mut copy = self.copy(id)?;
        let root = copy.root();
        copy.assign(root, result, Origin::Internal)?;
        copy.drain()?;
        Ok(copy)
    }

    pub fn compare(&self, id: NodeId, other: &Value) -> Option<Ordering> {
        self.value(id).partial_cmp(other)
    }

    pub fn equals(&self, id: NodeId, other: &Value) -> bool {
        self.value(id) == *other
    }

    /// Structural equality across trees. Objects must declare the same
    /// fields with the same existence state; everything else compares values.
    pub fn node_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        match (self.slot(a).map(|n| &n.body), other.slot(b).map(|n| &n.body)) {
            (Some(Body::Fields(left)), Some(Body::Fields(right))) => {
                left.len() == right.len()
                    && left.iter().all(|(key, ca)| {
                        right.iter().find(|(k, _)| k == key).map_or(false, |(_, cb)| {
                            let exists = self.exists(*ca);
                            exists == other.exists(*cb) && (!exists || self.node_eq(*ca, other, *cb))
                        })
                    })
            }
            (Some(Body::Fields(_)), Some(_)) | (Some(_), Some(Body::Fields(_))) => false,
            (Some(_), Some(_)) => self.value(a) == other.value(b),
            _ => false,
        }
    }
}
