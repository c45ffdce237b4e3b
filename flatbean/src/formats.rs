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

//! The external collaborator of §6: something that turns a byte stream
//! into successive `(line, raw_text, tokens)` triples, and back. The
//! record/field layer never sees a `Read`/`Write` directly.

use std::io::{self, BufRead, Write};

use csv::{ReaderBuilder, WriterBuilder};

/// One line's worth of input, as handed to a [`RecordContext`](crate::context::RecordContext).
pub struct RawRecord {
    pub line: u64,
    pub raw_text: String,
    pub tokens: Vec<String>,
}

/// Pulls successive records from the underlying stream.
pub trait FormatReader {
    /// Returns `Ok(None)` at end of stream.
    fn read(&mut self) -> io::Result<Option<RawRecord>>;
}

/// Pushes successive records to the underlying stream.
pub trait FormatWriter {
    fn write(&mut self, tokens: &[String]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// One fixed-length line per record; `tokens` is left empty since
/// [`FieldDefinition`](crate::field::FieldDefinition) slices `raw_text`
/// directly by byte offset.
pub struct FixedLengthReader<R> {
    inner: R,
    line: u64,
}

impl<R: BufRead> FixedLengthReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line: 0 }
    }
}

impl<R: BufRead> FormatReader for FixedLengthReader<R> {
    fn read(&mut self) -> io::Result<Option<RawRecord>> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        self.line += 1;
        Ok(Some(RawRecord {
            line: self.line,
            raw_text: buf,
            tokens: Vec::new(),
        }))
    }
}

pub struct FixedLengthWriter<W> {
    inner: W,
}

impl<W: Write> FixedLengthWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> FormatWriter for FixedLengthWriter<W> {
    fn write(&mut self, tokens: &[String]) -> io::Result<()> {
        for token in tokens {
            self.inner.write_all(token.as_bytes())?;
        }
        self.inner.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// One delimited line per record, split on a single-byte delimiter; not a
/// full CSV dialect (no quoting), matching §3's "generic delimited"
/// format as distinct from [`CsvReader`].
pub struct DelimitedReader<R> {
    inner: R,
    delimiter: char,
    line: u64,
}

impl<R: BufRead> DelimitedReader<R> {
    pub fn new(inner: R, delimiter: char) -> Self {
        Self {
            inner,
            delimiter,
            line: 0,
        }
    }
}

impl<R: BufRead> FormatReader for DelimitedReader<R> {
    fn read(&mut self) -> io::Result<Option<RawRecord>> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        self.line += 1;
        let tokens = buf.split(self.delimiter).map(str::to_owned).collect();
        Ok(Some(RawRecord {
            line: self.line,
            raw_text: buf,
            tokens,
        }))
    }
}

pub struct DelimitedWriter<W> {
    inner: W,
    delimiter: char,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(inner: W, delimiter: char) -> Self {
        Self { inner, delimiter }
    }
}

impl<W: Write> FormatWriter for DelimitedWriter<W> {
    fn write(&mut self, tokens: &[String]) -> io::Result<()> {
        let line = tokens.join(&self.delimiter.to_string());
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// RFC 4180 CSV, via the `csv` crate's reader/writer directly (quoting,
/// embedded delimiters, and escaping are its concern, not ours).
pub struct CsvReader<R> {
    inner: csv::Reader<R>,
    line: u64,
}

impl<R: io::Read> CsvReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: ReaderBuilder::new().has_headers(false).from_reader(inner),
            line: 0,
        }
    }
}

impl<R: io::Read> FormatReader for CsvReader<R> {
    fn read(&mut self) -> io::Result<Option<RawRecord>> {
        let mut record = csv::StringRecord::new();
        let read = self
            .inner
            .read_record(&mut record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if !read {
            return Ok(None);
        }
        self.line += 1;
        let tokens: Vec<String> = record.iter().map(str::to_owned).collect();
        Ok(Some(RawRecord {
            line: self.line,
            raw_text: tokens.join(","),
            tokens,
        }))
    }
}

pub struct CsvWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: WriterBuilder::new().has_headers(false).from_writer(inner),
        }
    }
}

impl<W: Write> FormatWriter for CsvWriter<W> {
    fn write(&mut self, tokens: &[String]) -> io::Result<()> {
        self.inner
            .write_record(tokens)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_length_reader_yields_raw_lines() {
        let data = "0001JOHN \n0002JANE \n";
        let mut reader = FixedLengthReader::new(data.as_bytes());
        let first = reader.read().unwrap().unwrap();
        assert_eq!(first.raw_text, "0001JOHN ");
        assert_eq!(first.line, 1);
        let second = reader.read().unwrap().unwrap();
        assert_eq!(second.raw_text, "0002JANE ");
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn delimited_reader_splits_on_delimiter() {
        let data = "a|b|c\n";
        let mut reader = DelimitedReader::new(data.as_bytes(), '|');
        let rec = reader.read().unwrap().unwrap();
        assert_eq!(rec.tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn csv_reader_handles_quoted_fields() {
        let data = "a,\"b,c\",d\n";
        let mut reader = CsvReader::new(data.as_bytes());
        let rec = reader.read().unwrap().unwrap();
        assert_eq!(rec.tokens, vec!["a", "b,c", "d"]);
    }

    #[test]
    fn csv_writer_round_trips_a_row() {
        let mut buf = Vec::new();
        {
            let mut writer = CsvWriter::new(&mut buf);
            writer
                .write(&["a".to_string(), "b,c".to_string()])
                .unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "a,\"b,c\"\n");
    }
}
