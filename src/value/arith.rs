//! Arithmetic on plain values, used by the node-level operators.

use super::Value;
use crate::error::{SchemaError, SchemaResult};

/// Binary operators available on node values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        }
    }
}

fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value) -> SchemaError {
    SchemaError::type_mismatch(
        format!(
            "unsupported operand types for {}: {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ),
        "",
    )
}

fn overflow(op: BinaryOp) -> SchemaError {
    SchemaError::constraint(format!("integer overflow in {}", op.symbol()), "")
}

fn division_by_zero() -> SchemaError {
    SchemaError::constraint("division by zero", "")
}

fn floor_div_i64(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn floor_rem_i64(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn floor_rem_f64(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        r + b
    } else {
        r
    }
}

impl Value {
    /// Apply `op` to `self` and `rhs`.
    pub fn apply(&self, op: BinaryOp, rhs: &Value) -> SchemaResult<Value> {
        match op {
            BinaryOp::Add => self.add(rhs),
            BinaryOp::Sub => self.sub(rhs),
            BinaryOp::Mul => self.mul(rhs),
            BinaryOp::Div => self.div(rhs),
            BinaryOp::FloorDiv => self.floor_div(rhs),
            BinaryOp::Rem => self.rem(rhs),
            BinaryOp::Pow => self.pow(rhs),
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                self.bitwise(op, rhs)
            }
        }
    }

    pub fn add(&self, rhs: &Value) -> SchemaResult<Value> {
        let op = BinaryOp::Add;
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or_else(|| overflow(op)),
            (Value::Timestamp(a), Value::Int(b)) => {
                a.checked_add(*b).map(Value::Timestamp).ok_or_else(|| overflow(op))
            }
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => Ok(Value::List([a.as_slice(), b.as_slice()].concat())),
            (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple([a.as_slice(), b.as_slice()].concat())),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(Value::Bytes([a.as_slice(), b.as_slice()].concat())),
            _ => self.float_op(op, rhs, |a, b| a + b),
        }
    }

    pub fn sub(&self, rhs: &Value) -> SchemaResult<Value> {
        let op = BinaryOp::Sub;
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int).ok_or_else(|| overflow(op)),
            (Value::Timestamp(a), Value::Int(b)) => {
                a.checked_sub(*b).map(Value::Timestamp).ok_or_else(|| overflow(op))
            }
            (Value::Timestamp(a), Value::Timestamp(b)) => {
                a.checked_sub(*b).map(Value::Int).ok_or_else(|| overflow(op))
            }
            _ => self.float_op(op, rhs, |a, b| a - b),
        }
    }

    pub fn mul(&self, rhs: &Value) -> SchemaResult<Value> {
        let op = BinaryOp::Mul;
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int).ok_or_else(|| overflow(op)),
            (Value::String(s), Value::Int(n)) => Ok(Value::String(s.repeat(usize::try_from(*n).unwrap_or(0)))),
            (Value::List(items), Value::Int(n)) => {
                let times = usize::try_from(*n).unwrap_or(0);
                Ok(Value::List(items.iter().cloned().cycle().take(items.len() * times).collect()))
            }
            _ => self.float_op(op, rhs, |a, b| a * b),
        }
    }

    /// True division, always producing a float.
    pub fn div(&self, rhs: &Value) -> SchemaResult<Value> {
        let op = BinaryOp::Div;
        match (numeric(self), numeric(rhs)) {
            (Some(_), Some(b)) if b == 0.0 => Err(division_by_zero()),
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(unsupported(op, self, rhs)),
        }
    }

    /// Division rounding towards negative infinity.
    pub fn floor_div(&self, rhs: &Value) -> SchemaResult<Value> {
        let op = BinaryOp::FloorDiv;
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(division_by_zero()),
            (Value::Int(a), Value::Int(b)) => floor_div_i64(*a, *b).map(Value::Int).ok_or_else(|| overflow(op)),
            _ => match (numeric(self), numeric(rhs)) {
                (Some(_), Some(b)) if b == 0.0 => Err(division_by_zero()),
                (Some(a), Some(b)) => Ok(Value::Float((a / b).floor())),
                _ => Err(unsupported(op, self, rhs)),
            },
        }
    }

    /// Remainder carrying the sign of the divisor.
    pub fn rem(&self, rhs: &Value) -> SchemaResult<Value> {
        let op = BinaryOp::Rem;
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(division_by_zero()),
            (Value::Int(a), Value::Int(b)) => floor_rem_i64(*a, *b).map(Value::Int).ok_or_else(|| overflow(op)),
            _ => match (numeric(self), numeric(rhs)) {
                (Some(_), Some(b)) if b == 0.0 => Err(division_by_zero()),
                (Some(a), Some(b)) => Ok(Value::Float(floor_rem_f64(a, b))),
                _ => Err(unsupported(op, self, rhs)),
            },
        }
    }

    pub fn pow(&self, rhs: &Value) -> SchemaResult<Value> {
        let op = BinaryOp::Pow;
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) if *b >= 0 => {
                let exp = u32::try_from(*b).map_err(|_| overflow(op))?;
                a.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow(op))
            }
            _ => self.float_op(op, rhs, f64::powf),
        }
    }

    fn bitwise(&self, op: BinaryOp, rhs: &Value) -> SchemaResult<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let result = match op {
                    BinaryOp::BitAnd => Some(a & b),
                    BinaryOp::BitOr => Some(a | b),
                    BinaryOp::BitXor => Some(a ^ b),
                    BinaryOp::Shl => u32::try_from(*b).ok().and_then(|s| a.checked_shl(s)),
                    BinaryOp::Shr => u32::try_from(*b).ok().and_then(|s| a.checked_shr(s)),
                    _ => None,
                };
                result.map(Value::Int).ok_or_else(|| overflow(op))
            }
            (Value::Bool(a), Value::Bool(b)) => match op {
                BinaryOp::BitAnd => Ok(Value::Bool(a & b)),
                BinaryOp::BitOr => Ok(Value::Bool(a | b)),
                BinaryOp::BitXor => Ok(Value::Bool(a ^ b)),
                _ => Err(unsupported(op, self, rhs)),
            },
            _ => Err(unsupported(op, self, rhs)),
        }
    }

    fn float_op(&self, op: BinaryOp, rhs: &Value, f: impl Fn(f64, f64) -> f64) -> SchemaResult<Value> {
        match (self, rhs) {
            (Value::Float(_), _) | (_, Value::Float(_)) => match (numeric(self), numeric(rhs)) {
                (Some(a), Some(b)) => Ok(Value::Float(f(a, b))),
                _ => Err(unsupported(op, self, rhs)),
            },
            (Value::Int(a), Value::Int(b)) if op == BinaryOp::Pow => {
                Ok(Value::Float(f(*a as f64, *b as f64)))
            }
            _ => Err(unsupported(op, self, rhs)),
        }
    }
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}
