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

//! The writer driver (§4.5). By default a writer is asymmetric with the
//! reader: it locates whichever record definition's identifier fields
//! match the bean, with no cardinality or order enforcement. `strict()`
//! additionally walks the layout the way a reader would, so a bean
//! written out of its configured sequence is rejected rather than
//! silently emitted.

use std::sync::Arc;

use crate::bean::Bean;
use crate::context::{RecordContext, StreamFormat};
use crate::error::{RecordFault, StreamResult, WriterFault};
use crate::formats::FormatWriter;
use crate::layout::{LayoutInstance, MappingTree, NodeId};

pub struct StreamWriter<W> {
    sink: W,
    tree: Arc<MappingTree>,
    strict: Option<LayoutInstance>,
}

impl<W: FormatWriter> StreamWriter<W> {
    pub fn new(sink: W, tree: Arc<MappingTree>) -> Self {
        Self {
            sink,
            tree,
            strict: None,
        }
    }

    /// A writer that also enforces the layout's cardinality and order,
    /// as the default writer deliberately does not (§ Open Questions).
    pub fn strict(sink: W, tree: Arc<MappingTree>) -> Self {
        let strict = LayoutInstance::new(tree.clone());
        Self {
            sink,
            tree,
            strict: Some(strict),
        }
    }

    /// Formats `bean` against whichever record definition uniquely
    /// matches it, and writes the resulting tokens.
    pub fn write(&mut self, bean: &dyn Bean) -> StreamResult<()> {
        let id = self.unique_match(bean)?;
        let record = self.tree.record(id).expect("matched node id names a record");
        let tokens = record.format_bean(bean, &self.tree.handlers)?;

        if let Some(layout) = &mut self.strict {
            let ctx = synthetic_context(&tokens, self.tree.format);
            match layout.match_next(&ctx) {
                Some(matched) if matched == id => {}
                _ => {
                    log::warn!("record '{}' would be written out of sequence", record.name);
                    return Err(WriterFault::OutOfSequence {
                        record: record.name.clone(),
                    }
                    .into());
                }
            }
        }

        self.sink.write(&tokens)?;
        Ok(())
    }

    /// Flushes the underlying sink. In strict mode, also checks that
    /// every node's `minOccurs` was reached, the write-side analogue of
    /// the reader's `close()`.
    pub fn finish(mut self) -> StreamResult<()> {
        if let Some(layout) = &self.strict {
            if let Some(id) = layout.close() {
                let expected = layout.tree().node(id).kind.name().to_string();
                return Err(RecordFault::Sequence { line: 0, expected }.into());
            }
        }
        self.sink.flush()?;
        Ok(())
    }

    fn unique_match(&self, bean: &dyn Bean) -> StreamResult<NodeId> {
        let mut matches = Vec::new();
        for id in 0..self.tree.len() {
            if let Some(record) = self.tree.record(id) {
                if record.matches_bean(bean, &self.tree.handlers) {
                    matches.push(id);
                }
            }
        }
        match matches.as_slice() {
            [] => Err(WriterFault::NoMatchingRecord.into()),
            [only] => Ok(*only),
            many => Err(WriterFault::AmbiguousRecord {
                candidates: many
                    .iter()
                    .map(|&id| self.tree.node(id).kind.name().to_string())
                    .collect(),
            }
            .into()),
        }
    }
}

fn synthetic_context(tokens: &[String], format: StreamFormat) -> RecordContext {
    let raw_text = match format {
        StreamFormat::FixedLength => tokens.concat(),
        StreamFormat::Delimited | StreamFormat::Csv => tokens.join(","),
    };
    RecordContext::new(0, raw_text, tokens.to_vec(), format)
}
