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

//! Shapes a tokenised input into a bean, and a bean into tokens (§4.3).

use crate::bean::{Bean, BeanFactory};
use crate::context::RecordContext;
use crate::error::{RecordFault, WriterFault};
use crate::field::{FieldDefinition, FieldOutcome};
use crate::handler::TypeHandlerRegistry;
use crate::value::Occurs;

/// An ordered collection of field definitions, plus an optional bean
/// binding (§3 "Record definition").
pub struct RecordDefinition {
    pub name: String,
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    pub fields: Vec<FieldDefinition>,
    pub bean_factory: Option<BeanFactory>,
}

impl RecordDefinition {
    pub fn identifier_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.identifier)
    }

    pub fn has_identifiers(&self) -> bool {
        self.fields.iter().any(|f| f.identifier)
    }

    /// `matches(tokenised record)` (§4.3): true iff every identifier field
    /// parses, without validation errors, to text matching its
    /// literal/regex. Vacuously true for a record with no identifier
    /// fields — the builder guarantees such a record is the sole child of
    /// its cohort (§4.4), so it always matches by elimination.
    pub fn matches_record(&self, ctx: &RecordContext) -> bool {
        self.identifier_fields().all(|f| match ctx.extract(f.position, f.width) {
            Ok(Some(text)) => {
                let text = if f.trim { text.trim().to_owned() } else { text };
                f.matches_text(&text)
            }
            _ => false,
        })
    }

    /// `matches(bean)` (§4.3): true iff every identifier field's
    /// value-side match holds for the candidate bean.
    pub fn matches_bean(&self, bean: &dyn Bean, registry: &TypeHandlerRegistry) -> bool {
        self.identifier_fields().all(|f| match &f.property {
            Some(property) => match bean.get_property(property) {
                Some(value) => f.matches_value(&value, registry),
                None => false,
            },
            None => false,
        })
    }

    /// `parseBean` (§4.3): every field is parsed even after the first
    /// invalid one, so every fault surfaces; the returned bean is `None`
    /// whenever any field reported a fault.
    pub fn parse_bean(
        &self,
        ctx: &mut RecordContext,
        registry: &TypeHandlerRegistry,
    ) -> Result<Option<Box<dyn Bean>>, RecordFault> {
        ctx.record_name = self.name.clone();

        let mut bean = self.bean_factory.map(|f| f());
        let mut any_invalid = false;

        for field in &self.fields {
            match field.parse(ctx, registry) {
                FieldOutcome::Invalid => any_invalid = true,
                FieldOutcome::Missing => {}
                FieldOutcome::Value(value) => {
                    if let (Some(bean), Some(property)) = (bean.as_mut(), &field.property) {
                        if bean.set_property(property, value).is_err() {
                            any_invalid = true;
                        }
                    }
                }
            }
        }

        if ctx.is_malformed() {
            return Err(RecordFault::Malformed {
                line: ctx.line,
                record_text: ctx.raw_text.clone(),
                reason: ctx.malformed.clone().unwrap_or_default(),
            });
        }

        if any_invalid || !ctx.field_faults.is_empty() {
            return Err(RecordFault::Invalid {
                line: ctx.line,
                record: self.name.clone(),
                faults: std::mem::take(&mut ctx.field_faults),
            });
        }

        Ok(bean)
    }

    /// `formatBean` (§4.3): projects each bound property, formats it, and
    /// emits tokens in field order. A handler unable to format a value
    /// raises a writer fault rather than silently emitting an empty token.
    pub fn format_bean(
        &self,
        bean: &dyn Bean,
        registry: &TypeHandlerRegistry,
    ) -> Result<Vec<String>, WriterFault> {
        let mut tokens = Vec::new();
        for field in &self.fields {
            let value = field
                .property
                .as_deref()
                .and_then(|p| bean.get_property(p))
                .unwrap_or(crate::value::Value::Null);
            let formatted = field.format(&value, registry).map_err(|e| WriterFault::Format {
                record: self.name.clone(),
                field: field.name.clone(),
                reason: e.to_string(),
            })?;
            tokens.extend(formatted);
        }
        Ok(tokens)
    }
}

impl std::fmt::Debug for RecordDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordDefinition")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::PropertyError;
    use crate::context::StreamFormat;
    use crate::field::CollectionKind;
    use crate::value::{TypeKind, Value};
    use std::any::Any;

    #[derive(Debug, Default)]
    struct Passenger {
        kind: String,
        name: String,
    }

    impl Bean for Passenger {
        fn get_property(&self, name: &str) -> Option<Value> {
            match name {
                "kind" => Some(Value::Text(self.kind.clone())),
                "name" => Some(Value::Text(self.name.clone())),
                _ => None,
            }
        }

        fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
            let text = value.as_text().unwrap_or_default().to_owned();
            match name {
                "kind" => self.kind = text,
                "name" => self.name = text,
                other => {
                    return Err(PropertyError::Unknown {
                        property: other.to_owned(),
                    })
                }
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn field(name: &str, position: usize) -> FieldDefinition {
        FieldDefinition {
            name: name.to_owned(),
            position,
            width: None,
            min_length: None,
            max_length: None,
            min_occurs: 1,
            max_occurs: Occurs::Bounded(1),
            required: false,
            trim: false,
            identifier: false,
            literal: None,
            regex: None,
            default: None,
            declared_type: TypeKind::Text,
            handler_name: None,
            property: None,
            collection: CollectionKind::Scalar,
            primitive: false,
        }
    }

    fn passenger_record() -> RecordDefinition {
        let mut kind = field("kind", 0);
        kind.identifier = true;
        kind.literal = Some("PAX".into());
        kind.property = Some("kind".into());

        let mut name = field("name", 1);
        name.property = Some("name".into());

        RecordDefinition {
            name: "passenger".into(),
            min_occurs: 0,
            max_occurs: Occurs::Unbounded,
            fields: vec![kind, name],
            bean_factory: Some(|| Box::new(Passenger::default())),
        }
    }

    fn ctx(tokens: &[&str]) -> RecordContext {
        RecordContext::new(
            1,
            tokens.join(","),
            tokens.iter().map(|s| s.to_string()).collect(),
            StreamFormat::Csv,
        )
    }

    #[test]
    fn matches_record_checks_the_identifier_literal() {
        let rec = passenger_record();
        assert!(rec.matches_record(&ctx(&["PAX", "Ada"])));
        assert!(!rec.matches_record(&ctx(&["CREW", "Ada"])));
    }

    #[test]
    fn anonymous_record_matches_vacuously() {
        let rec = RecordDefinition {
            name: "row".into(),
            min_occurs: 0,
            max_occurs: Occurs::Unbounded,
            fields: vec![field("id", 0)],
            bean_factory: None,
        };
        assert!(rec.matches_record(&ctx(&["42"])));
    }

    #[test]
    fn parse_bean_populates_bound_properties() {
        let rec = passenger_record();
        let registry = TypeHandlerRegistry::new();
        let mut c = ctx(&["PAX", "Ada Lovelace"]);
        let bean = rec.parse_bean(&mut c, &registry).unwrap().unwrap();
        assert_eq!(
            bean.get_property("name"),
            Some(Value::Text("Ada Lovelace".into()))
        );
    }

    #[test]
    fn parse_bean_reports_every_field_fault() {
        let mut rec = passenger_record();
        rec.fields[1].min_length = Some(20);
        let registry = TypeHandlerRegistry::new();
        let mut c = ctx(&["PAX", "Ada"]);
        let err = rec.parse_bean(&mut c, &registry).unwrap_err();
        match err {
            RecordFault::Invalid { faults, .. } => assert_eq!(faults.len(), 1),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn matches_bean_checks_the_bound_identifier_property() {
        let rec = passenger_record();
        let registry = TypeHandlerRegistry::new();
        let mut bean = Passenger::default();
        bean.kind = "PAX".into();
        assert!(rec.matches_bean(&bean, &registry));
        bean.kind = "CREW".into();
        assert!(!rec.matches_bean(&bean, &registry));
    }

    #[test]
    fn format_bean_emits_tokens_in_field_order() {
        let rec = passenger_record();
        let registry = TypeHandlerRegistry::new();
        let bean = Passenger {
            kind: "PAX".into(),
            name: "Ada Lovelace".into(),
        };
        let tokens = rec.format_bean(&bean, &registry).unwrap();
        assert_eq!(tokens, vec!["PAX".to_string(), "Ada Lovelace".to_string()]);
    }

    #[test]
    fn format_bean_surfaces_a_handler_format_fault() {
        let mut rec = passenger_record();
        rec.fields[1].declared_type = TypeKind::Integer;
        let registry = TypeHandlerRegistry::new();
        let bean = Passenger {
            kind: "PAX".into(),
            name: "not a number".into(),
        };
        let err = rec.format_bean(&bean, &registry).unwrap_err();
        match err {
            WriterFault::Format { record, field, .. } => {
                assert_eq!(record, "passenger");
                assert_eq!(field, "name");
            }
            other => panic!("expected Format fault, got {other:?}"),
        }
    }
}
