// SPDX-License-Identifier: Apache-2.0
// Copyright 2024, 2026 Joe Pearson
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

use std::fmt;
use std::io;

/// A rule code as recognised by the error-code surface (§6).
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum RuleCode {
    Malformed,
    Unidentified,
    Unexpected,
    Sequence,
    Required,
    Literal,
    MinLength,
    MaxLength,
    Regex,
    MinOccurs,
    Type,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleCode::Malformed => "malformed",
            RuleCode::Unidentified => "unidentified",
            RuleCode::Unexpected => "unexpected",
            RuleCode::Sequence => "sequence",
            RuleCode::Required => "required",
            RuleCode::Literal => "literal",
            RuleCode::MinLength => "minLength",
            RuleCode::MaxLength => "maxLength",
            RuleCode::Regex => "regex",
            RuleCode::MinOccurs => "minOccurs",
            RuleCode::Type => "type",
        };
        write!(f, "{s}")
    }
}

/// One field-level validation failure, accumulated on a record context.
#[derive(Clone, PartialEq, Debug)]
pub struct FieldFault {
    pub field: String,
    pub rule: RuleCode,
    pub params: Vec<(String, String)>,
}

impl FieldFault {
    pub fn new<const N: usize>(field: &str, rule: RuleCode, params: [(&str, String); N]) -> Self {
        Self {
            field: field.to_owned(),
            rule,
            params: params.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
        }
    }
}

impl fmt::Display for FieldFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' failed rule '{}'", self.field, self.rule)?;
        for (k, v) in &self.params {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

/// A fault raised while building a mapping tree (§6 loader contract).
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ConfigError {
    DuplicateRecordName {
        group: String,
        name: String,
    },
    DuplicateFieldPosition {
        record: String,
        field: String,
        position: usize,
    },
    OverlappingCollection {
        record: String,
        field: String,
        position: usize,
    },
    InvalidOccurs {
        owner: String,
        min: usize,
        max: usize,
    },
    MissingIdentifier {
        record: String,
    },
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DuplicateRecordName { group, name } => {
                write!(f, "group '{group}' already has a child named '{name}'")
            }
            ConfigError::DuplicateFieldPosition {
                record,
                field,
                position,
            } => {
                write!(
                    f,
                    "record '{record}' field '{field}' reuses position {position}"
                )
            }
            ConfigError::OverlappingCollection {
                record,
                field,
                position,
            } => {
                write!(
                    f,
                    "record '{record}' collection field '{field}' overlaps a fixed sibling at position {position}"
                )
            }
            ConfigError::InvalidOccurs { owner, min, max } => {
                write!(f, "'{owner}' has minOccurs {min} > maxOccurs {max}")
            }
            ConfigError::MissingIdentifier { record } => {
                write!(
                    f,
                    "record '{record}' has no identifier field and is not the sole child of its cohort"
                )
            }
            ConfigError::InvalidPattern {
                field,
                pattern,
                reason,
            } => {
                write!(f, "field '{field}' regex '{pattern}' is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A fault surfaced by a [`TypeHandler`](crate::handler::TypeHandler).
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum HandlerError {
    Parse { text: String, reason: String },
    Format { reason: String },
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Parse { text, reason } => {
                write!(f, "cannot parse \"{text}\": {reason}")
            }
            HandlerError::Format { reason } => write!(f, "cannot format value: {reason}"),
        }
    }
}

impl std::error::Error for HandlerError {}

/// A structural, per-record fault (§7): raised directly from `read`, as
/// opposed to the accumulated [`FieldFault`]s of an invalid record.
#[derive(Clone, PartialEq, Debug)]
pub enum RecordFault {
    Malformed {
        line: u64,
        record_text: String,
        reason: String,
    },
    Unidentified {
        line: u64,
        record_text: String,
    },
    Unexpected {
        line: u64,
        record: String,
        record_text: String,
    },
    Sequence {
        line: u64,
        expected: String,
    },
    Invalid {
        line: u64,
        record: String,
        faults: Vec<FieldFault>,
    },
}

impl fmt::Display for RecordFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFault::Malformed { line, reason, .. } => {
                write!(f, "line {line}: malformed record ({reason})")
            }
            RecordFault::Unidentified { line, .. } => {
                write!(f, "line {line}: unidentified record")
            }
            RecordFault::Unexpected { line, record, .. } => {
                write!(f, "line {line}: unexpected record '{record}'")
            }
            RecordFault::Sequence { line, expected } => {
                write!(f, "line {line}: expected '{expected}' before end of stream")
            }
            RecordFault::Invalid {
                line,
                record,
                faults,
            } => {
                write!(
                    f,
                    "line {line}: record '{record}' has {} field error(s)",
                    faults.len()
                )
            }
        }
    }
}

impl std::error::Error for RecordFault {}

/// A fault raised by the writer driver (§4.5).
#[derive(Clone, PartialEq, Debug)]
pub enum WriterFault {
    NoMatchingRecord,
    AmbiguousRecord {
        candidates: Vec<String>,
    },
    Format {
        record: String,
        field: String,
        reason: String,
    },
    /// Strict-writer mode only (§4.5 writer asymmetry): the bean matched a
    /// record definition, but not the one the layout expects next.
    OutOfSequence {
        record: String,
    },
}

impl fmt::Display for WriterFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterFault::NoMatchingRecord => write!(f, "no record definition matches this bean"),
            WriterFault::AmbiguousRecord { candidates } => {
                write!(
                    f,
                    "multiple record definitions match this bean: {}",
                    candidates.join(", ")
                )
            }
            WriterFault::Format {
                record,
                field,
                reason,
            } => {
                write!(
                    f,
                    "record '{record}' field '{field}' failed to format: {reason}"
                )
            }
            WriterFault::OutOfSequence { record } => {
                write!(f, "record '{record}' would be written out of sequence")
            }
        }
    }
}

impl std::error::Error for WriterFault {}

/// The top-level error returned by reader/writer drivers.
#[derive(Debug)]
pub enum StreamError {
    Io(io::Error),
    Record(RecordFault),
    Writer(WriterFault),
    Config(ConfigError),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "stream I/O error: {e}"),
            StreamError::Record(e) => write!(f, "{e}"),
            StreamError::Writer(e) => write!(f, "{e}"),
            StreamError::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::Record(e) => Some(e),
            StreamError::Writer(e) => Some(e),
            StreamError::Config(e) => Some(e),
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<RecordFault> for StreamError {
    fn from(e: RecordFault) -> Self {
        StreamError::Record(e)
    }
}

impl From<WriterFault> for StreamError {
    fn from(e: WriterFault) -> Self {
        StreamError::Writer(e)
    }
}

impl From<ConfigError> for StreamError {
    fn from(e: ConfigError) -> Self {
        StreamError::Config(e)
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type StreamResult<T> = std::result::Result<T, StreamError>;
