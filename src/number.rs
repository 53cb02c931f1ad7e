use crate::error::BasicError;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// The numeric type of the language. BASIC does not distinguish integers
/// from floating-point numbers at the surface, so every value carries a tag
/// and operations promote to `Float` as soon as either operand is one.
///
/// Integer arithmetic wraps on overflow.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn is_integral(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    /// The integer part of the value, truncated toward zero.
    pub fn int_part(&self) -> i64 {
        match *self {
            Number::Int(value) => value,
            Number::Float(value) => value as i64,
        }
    }

    /// Truth in boolean context: a non-zero integer, or a float whose
    /// magnitude reaches the comparison epsilon.
    pub fn is_true(&self) -> bool {
        match *self {
            Number::Int(value) => value != 0,
            Number::Float(value) => value.abs() >= f64::EPSILON,
        }
    }

    /// Division follows the dialect's promotion rule: the quotient of two
    /// integers stays an integer only when the division is exact. A divisor
    /// whose integer part is zero is an error, whatever its tag.
    pub fn divide(self, rhs: Number) -> Result<Number, BasicError> {
        if rhs.int_part() == 0 {
            return Err(BasicError::runtime_error("Division by zero".to_string()));
        }

        match (self, rhs) {
            (Number::Int(left), Number::Int(right)) if left.wrapping_rem(right) == 0 => {
                Ok(Number::Int(left.wrapping_div(right)))
            }
            _ => Ok(Number::Float(self.as_f64() / rhs.as_f64())),
        }
    }

    pub fn modulo(self, rhs: Number) -> Result<Number, BasicError> {
        match (self, rhs) {
            (Number::Int(_), Number::Int(0)) => {
                Err(BasicError::runtime_error("Modulo by zero".to_string()))
            }
            (Number::Int(left), Number::Int(right)) => Ok(Number::Int(left.wrapping_rem(right))),
            _ => Err(BasicError::runtime_error(
                "Modulo is only defined on whole number types".to_string(),
            )),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<bool> for Number {
    fn from(value: bool) -> Self {
        Number::Int(value as i64)
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(left), Number::Int(right)) => Number::Int(left.wrapping_add(right)),
            _ => Number::Float(self.as_f64() + rhs.as_f64()),
        }
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(left), Number::Int(right)) => Number::Int(left.wrapping_sub(right)),
            _ => Number::Float(self.as_f64() - rhs.as_f64()),
        }
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(left), Number::Int(right)) => Number::Int(left.wrapping_mul(right)),
            _ => Number::Float(self.as_f64() * rhs.as_f64()),
        }
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Int(value) => Number::Int(value.wrapping_neg()),
            Number::Float(value) => Number::Float(-value),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(left), Number::Int(right)) => left == right,
            _ => (self.as_f64() - other.as_f64()).abs() < f64::EPSILON,
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Number) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }

        let less = match (self, other) {
            (Number::Int(left), Number::Int(right)) => left < right,
            _ => self.as_f64() < other.as_f64(),
        };

        Some(if less { Ordering::Less } else { Ordering::Greater })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Number::Int(value) => write!(f, "{}", value),
            Number::Float(value) => {
                // A float always shows its decimal point, so 3.0 prints as
                // "3.0" and not "3".
                if value.fract() == 0.0 && value.is_finite() {
                    write!(f, "{:.1}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
        }
    }
}
