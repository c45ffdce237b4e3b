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

//! The "external accessor" capability the Design Notes call for: a
//! [`Bean`] gets and sets properties by name so a [`RecordDefinition`]
//! doesn't need to depend on runtime reflection of user types. Implement
//! it by hand, or derive it with `#[derive(Bean)]` from `flatbean-derive`.
//!
//! [`RecordDefinition`]: crate::record::RecordDefinition

use std::any::Any;
use std::fmt;

use crate::value::Value;

/// A bean property that doesn't exist, or whose value didn't fit.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PropertyError {
    Unknown { property: String },
    TypeMismatch { property: String, expected: &'static str },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::Unknown { property } => write!(f, "no such property '{property}'"),
            PropertyError::TypeMismatch { property, expected } => {
                write!(f, "property '{property}' expects a {expected} value")
            }
        }
    }
}

impl std::error::Error for PropertyError {}

/// A user-defined object with named properties (§ GLOSSARY).
pub trait Bean: Any + fmt::Debug {
    /// Reads a property by name. `None` if the bean has no such property.
    fn get_property(&self, name: &str) -> Option<Value>;

    /// Writes a property by name.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError>;

    fn as_any(&self) -> &dyn Any;
}

/// Constructs a bean with its default constructor (§4.3 `parseBean`).
pub type BeanFactory = fn() -> Box<dyn Bean>;
