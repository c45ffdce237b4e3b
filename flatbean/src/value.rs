// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Joe Pearson
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The boxed value a [`TypeHandler`](crate::handler::TypeHandler) converts
//! to and from field text, and that a [`Bean`](crate::bean::Bean) stores
//! under a property name.

use chrono::NaiveDate;

/// A field or property value.
///
/// `Null` is a legal value distinct from [`FieldOutcome::Missing`] and
/// [`FieldOutcome::Invalid`](crate::field::FieldOutcome) — see the Design
/// Notes on sentinel values.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<TypeKind> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(TypeKind::Text),
            Value::Integer(_) => Some(TypeKind::Integer),
            Value::Float(_) => Some(TypeKind::Float),
            Value::Boolean(_) => Some(TypeKind::Boolean),
            Value::Date(_) => Some(TypeKind::Date),
            Value::List(_) => None,
        }
    }
}

/// The declared type of a field, used as half the type handler lookup key.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum TypeKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
}

/// An occurrence bound: either a concrete maximum or unbounded.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Occurs {
    Bounded(usize),
    Unbounded,
}

impl Occurs {
    pub fn is_unbounded(self) -> bool {
        matches!(self, Occurs::Unbounded)
    }

    /// Whether `n` occurrences respects this bound.
    pub fn allows(self, n: usize) -> bool {
        match self {
            Occurs::Bounded(max) => n <= max,
            Occurs::Unbounded => true,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Occurs::Bounded(1)
    }
}

/// Converts a bean field into a [`Value`] for `#[derive(Bean)]`
/// (`flatbean-derive`)'s generated `get_property`.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Converts a [`Value`] into a bean field for `#[derive(Bean)]`'s
/// generated `set_property`. The error is a short reason, not a full
/// [`PropertyError`](crate::bean::PropertyError): the derive attaches the
/// property name itself.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, &'static str>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, &'static str> {
        Ok(value)
    }
}

macro_rules! primitive_value_conversion {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, &'static str> {
                match value {
                    Value::$variant(v) => Ok(v),
                    _ => Err($expected),
                }
            }
        }
    };
}

primitive_value_conversion!(String, Text, "text");
primitive_value_conversion!(i64, Integer, "integer");
primitive_value_conversion!(f64, Float, "float");
primitive_value_conversion!(bool, Boolean, "boolean");
primitive_value_conversion!(NaiveDate, Date, "date");

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, &'static str> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
