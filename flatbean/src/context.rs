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

//! The per-record runtime entity of §3: line number, raw text, tokenised
//! fields, and the accumulated field faults for the record currently being
//! parsed or matched.

use crate::error::FieldFault;

/// Which concrete format produced this record's tokens, and therefore how
/// a [`FieldDefinition`](crate::field::FieldDefinition) extracts text from
/// it (§6: the format reader/writer are out-of-scope collaborators, but
/// extraction still has to know whether "position" means a byte offset
/// into one fixed-length line or an index into an already-split token
/// list).
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum StreamFormat {
    FixedLength,
    Delimited,
    Csv,
}

/// One logical record, as handed to the field parser/formatter.
#[derive(Clone, Debug)]
pub struct RecordContext {
    pub line: u64,
    pub raw_text: String,
    pub tokens: Vec<String>,
    pub format: StreamFormat,
    pub record_name: String,
    pub field_faults: Vec<FieldFault>,
    pub malformed: Option<String>,
}

impl RecordContext {
    pub fn new(line: u64, raw_text: String, tokens: Vec<String>, format: StreamFormat) -> Self {
        Self {
            line,
            raw_text,
            tokens,
            format,
            record_name: String::new(),
            field_faults: Vec::new(),
            malformed: None,
        }
    }

    pub fn push_fault(&mut self, fault: FieldFault) {
        self.field_faults.push(fault);
    }

    pub fn mark_malformed(&mut self, reason: impl Into<String>) {
        if self.malformed.is_none() {
            self.malformed = Some(reason.into());
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed.is_some()
    }

    /// Extracts the raw text for `position`/`width` according to `format`.
    ///
    /// Returns `Ok(None)` when the field's text is absent (end of tokens,
    /// or the position starts past the end of the line). Returns `Err(())`
    /// when the extraction itself is malformed: an underflow in the
    /// fixed-length case (§4.2 step 2).
    pub fn extract(&self, position: usize, width: Option<usize>) -> Result<Option<String>, ()> {
        match self.format {
            StreamFormat::FixedLength => {
                let width = width.unwrap_or(0);
                let bytes = self.raw_text.as_bytes();
                if position >= bytes.len() {
                    return Ok(None);
                }
                let end = position + width;
                if end > bytes.len() {
                    return Err(());
                }
                match std::str::from_utf8(&bytes[position..end]) {
                    Ok(s) => Ok(Some(s.to_owned())),
                    Err(_) => Err(()),
                }
            }
            StreamFormat::Delimited | StreamFormat::Csv => Ok(self.tokens.get(position).cloned()),
        }
    }
}
