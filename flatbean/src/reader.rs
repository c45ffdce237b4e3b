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

//! The reader driver (§4.4-4.5): pulls raw records from a [`FormatReader`],
//! walks the layout, and produces beans one at a time.

use std::sync::Arc;

use crate::bean::Bean;
use crate::context::RecordContext;
use crate::error::{RecordFault, StreamResult};
use crate::formats::FormatReader;
use crate::layout::{LayoutInstance, MappingTree};

/// Reads beans from an underlying [`FormatReader`], advancing the layout
/// one record at a time.
///
/// A structural fault (unidentified/unexpected record) or a field-level
/// fault (invalid record) doesn't stop the stream: the underlying record
/// has already been consumed, so the next `read()` call picks up at the
/// following line (§7 recovery policy).
pub struct StreamReader<R> {
    source: R,
    layout: LayoutInstance,
    last_line: u64,
}

impl<R: FormatReader> StreamReader<R> {
    pub fn new(source: R, tree: Arc<MappingTree>) -> Self {
        Self {
            source,
            layout: LayoutInstance::new(tree),
            last_line: 0,
        }
    }

    /// Reads and maps the next record. `Ok(None)` at a clean end of
    /// stream: every node's `minOccurs` is satisfied by `close()`.
    ///
    /// A record with no bean bound (§3/§4.3: the bean class is optional)
    /// is matched, validated, and otherwise consumed like any other
    /// record — it just doesn't produce a value — so `read()` skips past
    /// it and continues on to the next record rather than reporting it as
    /// the end of the stream.
    pub fn read(&mut self) -> StreamResult<Option<Box<dyn Bean>>> {
        loop {
            let raw = match self.source.read()? {
                Some(raw) => raw,
                None => {
                    return match self.layout.close() {
                        Some(id) => {
                            let expected = self.layout.tree().node(id).kind.name().to_string();
                            log::warn!("end of stream before '{expected}' reached its minimum occurrences");
                            Err(RecordFault::Sequence {
                                line: self.last_line,
                                expected,
                            }
                            .into())
                        }
                        None => Ok(None),
                    };
                }
            };
            self.last_line = raw.line;

            let tree = self.layout.tree().clone();
            let mut ctx = RecordContext::new(raw.line, raw.raw_text, raw.tokens, tree.format);

            match self.layout.match_next(&ctx) {
                Some(id) => {
                    let record = tree.record(id).expect("matched node id names a record");
                    log::trace!("line {}: matched record '{}'", ctx.line, record.name);
                    match record.parse_bean(&mut ctx, &tree.handlers)? {
                        Some(bean) => return Ok(Some(bean)),
                        None => {
                            log::trace!(
                                "line {}: record '{}' has no bean binding, skipping",
                                ctx.line,
                                record.name
                            );
                            continue;
                        }
                    }
                }
                None => match tree.match_any(&ctx) {
                    Some(id) => {
                        let record = tree.node(id).kind.name().to_string();
                        log::debug!("line {}: record '{record}' matched out of sequence", ctx.line);
                        return Err(RecordFault::Unexpected {
                            line: ctx.line,
                            record,
                            record_text: ctx.raw_text,
                        }
                        .into());
                    }
                    None => {
                        log::debug!("line {}: no record definition matches", ctx.line);
                        return Err(RecordFault::Unidentified {
                            line: ctx.line,
                            record_text: ctx.raw_text,
                        }
                        .into());
                    }
                },
            }
        }
    }
}

impl<R: FormatReader> Iterator for StreamReader<R> {
    type Item = StreamResult<Box<dyn Bean>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read() {
            Ok(Some(bean)) => Some(Ok(bean)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::PropertyError;
    use crate::builder::{FieldBuilder, MappingBuilder, RecordBuilder};
    use crate::context::StreamFormat;
    use crate::formats::CsvReader;
    use crate::value::Value;
    use std::any::Any;

    #[derive(Debug, Default)]
    struct Kept {
        id: String,
    }

    impl Bean for Kept {
        fn get_property(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(Value::Text(self.id.clone())),
                _ => None,
            }
        }
        fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
            match name {
                "id" => {
                    self.id = value.as_text().unwrap_or_default().to_owned();
                    Ok(())
                }
                other => Err(PropertyError::Unknown {
                    property: other.to_owned(),
                }),
            }
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// A record with no bean binding shouldn't be mistaken for end of
    /// stream — it's simply skipped in favour of the next matching record.
    #[test]
    fn read_skips_past_an_unbound_record_instead_of_stopping() {
        let tree = MappingBuilder::new(StreamFormat::Csv)
            .record(
                0,
                RecordBuilder::new("skip")
                    .occurs(0, crate::value::Occurs::Unbounded)
                    .field(FieldBuilder::new("kind", 0).identifier(true).literal("S")),
            )
            .record(
                1,
                RecordBuilder::new("keep")
                    .field(FieldBuilder::new("kind", 0).identifier(true).literal("K"))
                    .field(FieldBuilder::new("id", 1).property("id"))
                    .bean::<Kept>(),
            )
            .build()
            .unwrap();

        let mut reader = StreamReader::new(CsvReader::new("S\nK,42\n".as_bytes()), Arc::new(tree));

        let bean = reader.read().unwrap().expect("keep record should surface");
        assert_eq!(bean.get_property("id"), Some(Value::Text("42".into())));
        assert!(reader.read().unwrap().is_none());
    }
}
