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

//! Reversible text/value converters (§4.1).
//!
//! A handler is pure and stateless; the registry built from [`new`](TypeHandlerRegistry::new)
//! is read-mostly and safe to share behind an `Arc` across reader/writer
//! instances (§5).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::HandlerError;
use crate::value::{TypeKind, Value};

/// Converts between a field's external text form and its internal value.
pub trait TypeHandler: fmt::Debug + Send + Sync {
    fn declared_type(&self) -> TypeKind;

    /// Parses `text` into a value of [`declared_type`](Self::declared_type).
    fn parse(&self, text: &str) -> Result<Value, HandlerError>;

    /// Formats `value` back to text. `Value::Null` formats to the empty
    /// string regardless of handler (§4.2 format contract).
    fn format(&self, value: &Value) -> Result<String, HandlerError>;
}

#[derive(Debug, Default)]
struct TextHandler;

impl TypeHandler for TextHandler {
    fn declared_type(&self) -> TypeKind {
        TypeKind::Text
    }

    fn parse(&self, text: &str) -> Result<Value, HandlerError> {
        Ok(Value::Text(text.to_owned()))
    }

    fn format(&self, value: &Value) -> Result<String, HandlerError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(s) => Ok(s.clone()),
            other => Err(HandlerError::Format {
                reason: format!("{other:?} is not text"),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct IntegerHandler;

impl TypeHandler for IntegerHandler {
    fn declared_type(&self) -> TypeKind {
        TypeKind::Integer
    }

    fn parse(&self, text: &str) -> Result<Value, HandlerError> {
        text.trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| HandlerError::Parse {
                text: text.to_owned(),
                reason: e.to_string(),
            })
    }

    fn format(&self, value: &Value) -> Result<String, HandlerError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Integer(n) => Ok(n.to_string()),
            other => Err(HandlerError::Format {
                reason: format!("{other:?} is not an integer"),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct FloatHandler;

impl TypeHandler for FloatHandler {
    fn declared_type(&self) -> TypeKind {
        TypeKind::Float
    }

    fn parse(&self, text: &str) -> Result<Value, HandlerError> {
        text.trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| HandlerError::Parse {
                text: text.to_owned(),
                reason: e.to_string(),
            })
    }

    fn format(&self, value: &Value) -> Result<String, HandlerError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Float(n) => Ok(n.to_string()),
            other => Err(HandlerError::Format {
                reason: format!("{other:?} is not a float"),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct BooleanHandler;

impl TypeHandler for BooleanHandler {
    fn declared_type(&self) -> TypeKind {
        TypeKind::Boolean
    }

    fn parse(&self, text: &str) -> Result<Value, HandlerError> {
        match text.trim() {
            "true" | "1" | "Y" | "y" => Ok(Value::Boolean(true)),
            "false" | "0" | "N" | "n" => Ok(Value::Boolean(false)),
            other => Err(HandlerError::Parse {
                text: other.to_owned(),
                reason: "not a recognised boolean literal".into(),
            }),
        }
    }

    fn format(&self, value: &Value) -> Result<String, HandlerError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Boolean(b) => Ok(if *b { "true" } else { "false" }.to_owned()),
            other => Err(HandlerError::Format {
                reason: format!("{other:?} is not a boolean"),
            }),
        }
    }
}

/// Date handler parameterised on a `strftime`-style pattern.
#[derive(Debug)]
pub struct DateHandler {
    pattern: String,
}

impl DateHandler {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Default for DateHandler {
    fn default() -> Self {
        Self::new("%Y-%m-%d")
    }
}

impl TypeHandler for DateHandler {
    fn declared_type(&self) -> TypeKind {
        TypeKind::Date
    }

    fn parse(&self, text: &str) -> Result<Value, HandlerError> {
        NaiveDate::parse_from_str(text.trim(), &self.pattern)
            .map(Value::Date)
            .map_err(|e| HandlerError::Parse {
                text: text.to_owned(),
                reason: e.to_string(),
            })
    }

    fn format(&self, value: &Value) -> Result<String, HandlerError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Date(d) => Ok(d.format(&self.pattern).to_string()),
            other => Err(HandlerError::Format {
                reason: format!("{other:?} is not a date"),
            }),
        }
    }
}

/// Lookup key: declared type plus an optional named handler (§4.1).
type RegistryKey = (TypeKind, Option<String>);

/// A read-mostly, shareable table of [`TypeHandler`]s.
///
/// Lookup falls back to the unnamed default handler for the declared type,
/// and finally to the identity (text) handler, matching "if no handler is
/// registered, the identity handler is used".
#[derive(Clone)]
pub struct TypeHandlerRegistry {
    named: HashMap<RegistryKey, Arc<dyn TypeHandler>>,
    defaults: HashMap<TypeKind, Arc<dyn TypeHandler>>,
    identity: Arc<dyn TypeHandler>,
}

impl fmt::Debug for TypeHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandlerRegistry")
            .field("named", &self.named.len())
            .field("defaults", &self.defaults.len())
            .finish()
    }
}

impl TypeHandlerRegistry {
    /// Builds a registry with the built-in handlers registered as defaults
    /// for their declared type.
    pub fn new() -> Self {
        let mut defaults: HashMap<TypeKind, Arc<dyn TypeHandler>> = HashMap::new();
        defaults.insert(TypeKind::Text, Arc::new(TextHandler));
        defaults.insert(TypeKind::Integer, Arc::new(IntegerHandler));
        defaults.insert(TypeKind::Float, Arc::new(FloatHandler));
        defaults.insert(TypeKind::Boolean, Arc::new(BooleanHandler));
        defaults.insert(TypeKind::Date, Arc::new(DateHandler::default()));

        Self {
            named: HashMap::new(),
            defaults,
            identity: Arc::new(TextHandler),
        }
    }

    /// Registers `handler` as the default for its declared type.
    pub fn register_default(&mut self, handler: Arc<dyn TypeHandler>) {
        self.defaults.insert(handler.declared_type(), handler);
    }

    /// Registers `handler` under `name`, scoped to its declared type.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn TypeHandler>) {
        let key = (handler.declared_type(), Some(name.into()));
        self.named.insert(key, handler);
    }

    /// Resolves the handler for `kind`/`name`, falling back to the type's
    /// default and finally to the identity handler.
    pub fn resolve(&self, kind: TypeKind, name: Option<&str>) -> Arc<dyn TypeHandler> {
        if let Some(name) = name {
            if let Some(h) = self.named.get(&(kind, Some(name.to_owned()))) {
                return h.clone();
            }
        }
        self.defaults
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| self.identity.clone())
    }
}

impl Default for TypeHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
