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

//! Bidirectional mapping between flat record streams — fixed-length,
//! CSV, or generically delimited — and bean objects.
//!
//! A [`MappingTree`] describes the shape of a stream: an ordered,
//! repeatable arrangement of [groups](layout) and [record
//! definitions](record::RecordDefinition), each built from [field
//! definitions](field::FieldDefinition) that bind a stream position to a
//! named property on a [`Bean`]. Build one with [`MappingBuilder`], then
//! read or write through it with [`StreamReader`]/[`StreamWriter`].
//!
//! # Example
//!
//! ```
//! use flatbean::builder::{FieldBuilder, MappingBuilder, RecordBuilder};
//! use flatbean::context::StreamFormat;
//! use flatbean::reader::StreamReader;
//! use flatbean::formats::CsvReader;
//! use flatbean::bean::{Bean, PropertyError};
//! use flatbean::value::Value;
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct Passenger {
//!     name: String,
//! }
//!
//! impl Bean for Passenger {
//!     fn get_property(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "name" => Some(Value::Text(self.name.clone())),
//!             _ => None,
//!         }
//!     }
//!     fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
//!         match name {
//!             "name" => {
//!                 self.name = value.as_text().unwrap_or_default().to_owned();
//!                 Ok(())
//!             }
//!             _ => Err(PropertyError::Unknown { property: name.to_owned() }),
//!         }
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = MappingBuilder::new(StreamFormat::Csv)
//!     .record(
//!         0,
//!         RecordBuilder::new("passenger")
//!             .field(FieldBuilder::new("name", 0).property("name"))
//!             .bean::<Passenger>(),
//!     )
//!     .build()?;
//!
//! let mut reader = StreamReader::new(CsvReader::new("Ada Lovelace\n".as_bytes()), Arc::new(tree));
//! let bean = reader.read()?.expect("one record");
//! assert_eq!(bean.get_property("name"), Some(Value::Text("Ada Lovelace".into())));
//! # Ok(())
//! # }
//! ```

pub mod bean;
pub mod builder;
pub mod context;
pub mod error;
pub mod field;
pub mod formats;
pub mod handler;
pub mod layout;
pub mod reader;
pub mod record;
pub mod value;
pub mod writer;

pub use bean::Bean;
pub use builder::MappingBuilder;
pub use error::StreamError;
pub use layout::MappingTree;
pub use reader::StreamReader;
pub use writer::StreamWriter;

// Re-export the derive macro alongside the trait it implements, the way
// `serde`/`serde_derive` do.
pub use flatbean_derive::Bean;
