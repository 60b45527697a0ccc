// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::{self, Debug, Display, Formatter};

use serde::ser::Serializer;
use serde::Serialize;

const F64_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

#[derive(Clone, Copy)]
pub enum Number {
    UInt(u64),
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_i128(value: i128) -> Option<Self> {
        if value >= 0 {
            if let Ok(u) = u64::try_from(value) {
                return Some(Number::UInt(u));
            }
        }
        i64::try_from(value).ok().map(Number::Int)
    }

    fn to_f64_lossy(self) -> f64 {
        match self {
            Number::UInt(v) => v as f64,
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn normalize_float(value: f64) -> Number {
        if value.is_finite() && value.fract() == 0.0 && value.abs() <= F64_SAFE_INTEGER {
            if value >= 0.0 {
                return Number::UInt(value as u64);
            }
            return Number::Int(value as i64);
        }
        Number::Float(value)
    }

    fn as_i128(&self) -> Option<i128> {
        match *self {
            Number::UInt(v) => Some(v as i128),
            Number::Int(v) => Some(v as i128),
            Number::Float(f) if f.fract() == 0.0 && f.abs() <= F64_SAFE_INTEGER => {
                Some(f as i128)
            }
            Number::Float(_) => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::UInt(_) | Number::Int(_) => true,
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Number::UInt(v) => Some(v),
            Number::Int(v) if v >= 0 => Some(v as u64),
            Number::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= F64_SAFE_INTEGER => {
                Some(f as u64)
            }
            _ => None,
        }
    }

    /// Adds two numbers. Integer addition stays exact; `None` on integer overflow.
    pub fn add(&self, rhs: &Self) -> Option<Number> {
        match (*self, *rhs) {
            (Number::Float(_), _) | (_, Number::Float(_)) => Some(Number::normalize_float(
                self.to_f64_lossy() + rhs.to_f64_lossy(),
            )),
            (Number::UInt(a), Number::UInt(b)) => a.checked_add(b).map(Number::UInt),
            (Number::Int(a), Number::Int(b)) => Number::from_i128(a as i128 + b as i128),
            (Number::Int(a), Number::UInt(b)) | (Number::UInt(b), Number::Int(a)) => {
                Number::from_i128(a as i128 + b as i128)
            }
        }
    }

    pub fn format_decimal(&self) -> String {
        match *self {
            Number::UInt(v) => v.to_string(),
            Number::Int(v) => v.to_string(),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => {
                format!("{}", f as i64)
            }
            Number::Float(f) => format!("{f}"),
        }
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Number::UInt(v) => serializer.serialize_u64(v),
            Number::Int(v) => serializer.serialize_i64(v),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => {
                serializer.serialize_i64(f as i64)
            }
            Number::Float(f) => serializer.serialize_f64(f),
        }
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::UInt(value)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::UInt(value as u64)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        if value >= 0 {
            Number::UInt(value as u64)
        } else {
            Number::Int(value)
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::from(value as i64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_i128(), other.as_i128()) {
            return a == b;
        }

        let a = self.to_f64_lossy();
        let b = other.to_f64_lossy();
        if a.is_nan() || b.is_nan() {
            return false;
        }
        a == b
    }
}
