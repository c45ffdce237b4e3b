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

//! Per-field contract (§4.2): position/width, occurrence bounds,
//! validation rules, optional type handler, optional bean-property
//! binding.

use regex::Regex;

use crate::context::RecordContext;
use crate::error::{FieldFault, HandlerError, RuleCode};
use crate::handler::TypeHandlerRegistry;
use crate::value::{Occurs, TypeKind, Value};

/// How a field's repeated extractions accumulate (§3 "collection kind").
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CollectionKind {
    Scalar,
    Array,
    Sequence,
}

/// The three-variant parse outcome mandated by Design Notes §9: `MISSING`
/// and `INVALID` are distinct from any legal value, including `Value::Null`.
#[derive(Debug)]
pub enum FieldOutcome {
    Value(Value),
    Missing,
    Invalid,
}

/// A field's full, immutable contract.
#[derive(Debug)]
pub struct FieldDefinition {
    pub name: String,
    pub position: usize,
    /// Fixed-length extraction width. Unused for delimited/CSV formats,
    /// where one token is already one field.
    pub width: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    pub required: bool,
    pub trim: bool,
    pub identifier: bool,
    pub literal: Option<String>,
    pub regex: Option<Regex>,
    pub default: Option<Value>,
    pub declared_type: TypeKind,
    pub handler_name: Option<String>,
    pub property: Option<String>,
    pub collection: CollectionKind,
    /// Mirrors a primitive bean property type: `Value::Null` is rejected
    /// for it (§3 "primitive-typed properties are not nullable").
    pub primitive: bool,
}

impl FieldDefinition {
    /// Parses this field out of `ctx`, per the scalar or collection
    /// algorithm of §4.2.
    pub fn parse(&self, ctx: &mut RecordContext, registry: &TypeHandlerRegistry) -> FieldOutcome {
        match self.collection {
            CollectionKind::Scalar => self.parse_scalar(ctx, registry),
            CollectionKind::Array | CollectionKind::Sequence => {
                self.parse_collection(ctx, registry)
            }
        }
    }

    fn parse_scalar(&self, ctx: &mut RecordContext, registry: &TypeHandlerRegistry) -> FieldOutcome {
        match self.parse_one(ctx, registry, self.position, true) {
            FieldOutcome::Missing => match &self.default {
                Some(default) => FieldOutcome::Value(default.clone()),
                None => FieldOutcome::Value(Value::Null),
            },
            other => other,
        }
    }

    fn parse_collection(
        &self,
        ctx: &mut RecordContext,
        registry: &TypeHandlerRegistry,
    ) -> FieldOutcome {
        let mut values = Vec::new();
        let mut invalid = false;
        let mut index = 0usize;

        loop {
            if let Occurs::Bounded(max) = self.max_occurs {
                if index >= max {
                    break;
                }
            }

            match self.parse_one(ctx, registry, self.position + index, false) {
                FieldOutcome::Missing => break,
                FieldOutcome::Invalid => {
                    invalid = true;
                    index += 1;
                }
                FieldOutcome::Value(v) => {
                    values.push(v);
                    index += 1;
                }
            }
        }

        if values.len() < self.min_occurs {
            ctx.push_fault(FieldFault::new(
                &self.name,
                RuleCode::MinOccurs,
                [
                    ("minOccurs", self.min_occurs.to_string()),
                    ("actual", values.len().to_string()),
                ],
            ));
            invalid = true;
        }

        if invalid {
            FieldOutcome::Invalid
        } else {
            FieldOutcome::Value(Value::List(values))
        }
    }

    /// Extracts and validates a single occurrence at `position`.
    ///
    /// `enforce_required` is false inside a collection loop: there,
    /// absence is never a `required` fault, only a `minOccurs` one (raised
    /// by the caller once the loop ends).
    fn parse_one(
        &self,
        ctx: &mut RecordContext,
        registry: &TypeHandlerRegistry,
        position: usize,
        enforce_required: bool,
    ) -> FieldOutcome {
        let text = match ctx.extract(position, self.width) {
            Err(()) => {
                ctx.mark_malformed(format!(
                    "field '{}' underflowed at position {position}",
                    self.name
                ));
                return FieldOutcome::Invalid;
            }
            Ok(text) => text,
        };

        let mut text = match text {
            None => {
                if enforce_required && self.required {
                    ctx.push_fault(FieldFault::new(&self.name, RuleCode::Required, []));
                    return FieldOutcome::Invalid;
                }
                return FieldOutcome::Missing;
            }
            Some(text) => text,
        };

        if self.trim {
            text = text.trim().to_owned();
        }

        let mut failed = false;

        if let Some(literal) = &self.literal {
            if literal != &text {
                ctx.push_fault(FieldFault::new(
                    &self.name,
                    RuleCode::Literal,
                    [("expected", literal.clone()), ("actual", text.clone())],
                ));
                failed = true;
            }
        }

        if let Some(min_length) = self.min_length {
            if text.chars().count() < min_length {
                ctx.push_fault(FieldFault::new(
                    &self.name,
                    RuleCode::MinLength,
                    [
                        ("minLength", min_length.to_string()),
                        ("actual", text.clone()),
                    ],
                ));
                failed = true;
            }
        }

        if let Some(max_length) = self.max_length {
            if text.chars().count() > max_length {
                ctx.push_fault(FieldFault::new(
                    &self.name,
                    RuleCode::MaxLength,
                    [
                        ("maxLength", max_length.to_string()),
                        ("actual", text.clone()),
                    ],
                ));
                failed = true;
            }
        }

        if let Some(regex) = &self.regex {
            if !regex.is_match(&text) {
                ctx.push_fault(FieldFault::new(
                    &self.name,
                    RuleCode::Regex,
                    [
                        ("pattern", regex.as_str().to_owned()),
                        ("actual", text.clone()),
                    ],
                ));
                failed = true;
            }
        }

        if failed {
            return FieldOutcome::Invalid;
        }

        let handler = registry.resolve(self.declared_type, self.handler_name.as_deref());
        match handler.parse(&text) {
            Ok(value) => {
                if self.primitive && value.is_null() {
                    ctx.push_fault(FieldFault::new(
                        &self.name,
                        RuleCode::Type,
                        [("reason", "null value for a primitive property".to_owned())],
                    ));
                    FieldOutcome::Invalid
                } else {
                    FieldOutcome::Value(value)
                }
            }
            Err(e) => {
                ctx.push_fault(FieldFault::new(
                    &self.name,
                    RuleCode::Type,
                    [("reason", e.to_string())],
                ));
                FieldOutcome::Invalid
            }
        }
    }

    /// Formats `value` into its field text(s). A collection emits between
    /// `minOccurs` and `maxOccurs` tokens, padding short collections with
    /// empty strings (§4.3 `formatBean`). When `width` is set (fixed-length
    /// layouts), each token is space-padded or truncated to exactly that
    /// many characters, mirroring how `extract` reads it back.
    pub fn format(
        &self,
        value: &Value,
        registry: &TypeHandlerRegistry,
    ) -> Result<Vec<String>, HandlerError> {
        let tokens = if let Some(literal) = &self.literal {
            let count = match self.collection {
                CollectionKind::Scalar => 1,
                _ => self.min_occurs.max(1),
            };
            vec![literal.clone(); count]
        } else {
            let handler = registry.resolve(self.declared_type, self.handler_name.as_deref());

            match self.collection {
                CollectionKind::Scalar => vec![handler.format(value)?],
                CollectionKind::Array | CollectionKind::Sequence => {
                    let items: Vec<Value> = match value {
                        Value::List(items) => items.clone(),
                        Value::Null => Vec::new(),
                        other => vec![other.clone()],
                    };
                    let mut tokens: Vec<String> = items
                        .iter()
                        .map(|v| handler.format(v))
                        .collect::<Result<_, _>>()?;
                    while tokens.len() < self.min_occurs {
                        tokens.push(String::new());
                    }
                    tokens
                }
            }
        };

        Ok(match self.width {
            Some(width) => tokens.into_iter().map(|t| pad_to_width(&t, width)).collect(),
            None => tokens,
        })
    }

    /// `matches(text)` of §4.2: used while reading to recognise a record
    /// identifier field.
    pub fn matches_text(&self, text: &str) -> bool {
        let literal_ok = match &self.literal {
            Some(lit) => lit == text,
            None => true,
        };
        let regex_ok = match &self.regex {
            Some(re) => re.is_match(text),
            None => true,
        };
        literal_ok && regex_ok
    }

    /// `matches(value)` of §4.2: used while writing to recognise which
    /// record definition a bean belongs to.
    pub fn matches_value(&self, value: &Value, registry: &TypeHandlerRegistry) -> bool {
        if let Some(kind) = value.kind() {
            if kind != self.declared_type {
                return false;
            }
        }
        let handler = registry.resolve(self.declared_type, self.handler_name.as_deref());
        match handler.format(value) {
            Ok(text) => self.matches_text(&text),
            Err(_) => false,
        }
    }
}

fn pad_to_width(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.chars().take(width).collect()
    } else {
        let mut padded = text.to_owned();
        padded.extend(std::iter::repeat(' ').take(width - len));
        padded
    }
}
