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

//! A fluent, validating API for assembling a [`MappingTree`] in code
//! (§6: the loader contract, without a file-format loader).
//!
//! `build()` enforces the constraints a loader would: unique names within
//! a group, non-overlapping field positions, `minOccurs <= maxOccurs`
//! everywhere, and at least one identifier field per record unless it is
//! the sole child of its order cohort.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;

use crate::bean::{Bean, BeanFactory};
use crate::context::StreamFormat;
use crate::error::{ConfigError, ConfigResult};
use crate::field::{CollectionKind, FieldDefinition};
use crate::handler::TypeHandlerRegistry;
use crate::layout::{DefNode, GroupDefinition, MappingTree, NodeId, NodeKind};
use crate::record::RecordDefinition;
use crate::value::{Occurs, TypeKind, Value};

/// Builds one [`FieldDefinition`] (§4.2).
pub struct FieldBuilder {
    name: String,
    position: usize,
    width: Option<usize>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min_occurs: usize,
    max_occurs: Occurs,
    required: bool,
    trim: bool,
    identifier: bool,
    literal: Option<String>,
    regex: Option<String>,
    default: Option<Value>,
    declared_type: TypeKind,
    handler_name: Option<String>,
    property: Option<String>,
    collection: CollectionKind,
    primitive: bool,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
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

    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn occurs(mut self, min: usize, max: Occurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn identifier(mut self, identifier: bool) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn literal(mut self, literal: impl Into<String>) -> Self {
        self.literal = Some(literal.into());
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn declared_type(mut self, kind: TypeKind) -> Self {
        self.declared_type = kind;
        self
    }

    pub fn handler(mut self, name: impl Into<String>) -> Self {
        self.handler_name = Some(name.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.property = Some(name.into());
        self
    }

    pub fn collection(mut self, kind: CollectionKind) -> Self {
        self.collection = kind;
        self
    }

    pub fn primitive(mut self, primitive: bool) -> Self {
        self.primitive = primitive;
        self
    }

    fn build(self, record_name: &str) -> ConfigResult<FieldDefinition> {
        if let Occurs::Bounded(max) = self.max_occurs {
            if self.min_occurs > max {
                return Err(ConfigError::InvalidOccurs {
                    owner: format!("{record_name}.{}", self.name),
                    min: self.min_occurs,
                    max,
                });
            }
        }

        let regex = match self.regex {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|e| ConfigError::InvalidPattern {
                field: self.name.clone(),
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(FieldDefinition {
            name: self.name,
            position: self.position,
            width: self.width,
            min_length: self.min_length,
            max_length: self.max_length,
            min_occurs: self.min_occurs,
            max_occurs: self.max_occurs,
            required: self.required,
            trim: self.trim,
            identifier: self.identifier,
            literal: self.literal,
            regex,
            default: self.default,
            declared_type: self.declared_type,
            handler_name: self.handler_name,
            property: self.property,
            collection: self.collection,
            primitive: self.primitive,
        })
    }
}

/// Builds one [`RecordDefinition`] (§4.3).
pub struct RecordBuilder {
    name: String,
    min_occurs: usize,
    max_occurs: Occurs,
    fields: Vec<FieldBuilder>,
    bean_factory: Option<BeanFactory>,
}

impl RecordBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_occurs: 0,
            max_occurs: Occurs::Unbounded,
            fields: Vec::new(),
            bean_factory: None,
        }
    }

    pub fn occurs(mut self, min: usize, max: Occurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Binds this record to bean type `B`, constructed with `B::default()`
    /// on each `parseBean` (§4.3).
    pub fn bean<B: Bean + Default + 'static>(mut self) -> Self {
        self.bean_factory = Some(|| Box::new(B::default()));
        self
    }
}

enum NodeBuilder {
    Group(GroupBuilder),
    Record(RecordBuilder),
}

/// Builds one group node: a repeatable ordered sequence of child groups
/// and records (§3 "group definition").
pub struct GroupBuilder {
    name: String,
    min_occurs: usize,
    max_occurs: Occurs,
    children: Vec<(u32, NodeBuilder)>,
}

impl GroupBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_occurs: 0,
            max_occurs: Occurs::Unbounded,
            children: Vec::new(),
        }
    }

    pub fn occurs(mut self, min: usize, max: Occurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    /// Adds a nested group as a child in order cohort `order`.
    pub fn group(mut self, order: u32, group: GroupBuilder) -> Self {
        self.children.push((order, NodeBuilder::Group(group)));
        self
    }

    /// Adds a record as a child in order cohort `order`.
    pub fn record(mut self, order: u32, record: RecordBuilder) -> Self {
        self.children.push((order, NodeBuilder::Record(record)));
        self
    }
}

/// Assembles a complete [`MappingTree`] for one stream format.
pub struct MappingBuilder {
    format: StreamFormat,
    handlers: Option<TypeHandlerRegistry>,
    root: GroupBuilder,
}

impl MappingBuilder {
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            handlers: None,
            // The implicit root wraps the stream's top-level children as a
            // single pass through their cohorts; it must not repeat itself,
            // or an overflowing top-level record would just start a fresh
            // root iteration instead of failing its own max_occurs.
            root: GroupBuilder::new("stream").occurs(1, Occurs::Bounded(1)),
        }
    }

    /// Overrides the default type handler registry built by
    /// [`TypeHandlerRegistry::new`].
    pub fn handlers(mut self, handlers: TypeHandlerRegistry) -> Self {
        self.handlers = Some(handlers);
        self
    }

    pub fn group(mut self, order: u32, group: GroupBuilder) -> Self {
        self.root = self.root.group(order, group);
        self
    }

    pub fn record(mut self, order: u32, record: RecordBuilder) -> Self {
        self.root = self.root.record(order, record);
        self
    }

    pub fn build(self) -> ConfigResult<MappingTree> {
        let mut nodes = Vec::new();
        let root = flatten_group(self.root, 0, None, &mut nodes)?;
        Ok(MappingTree::new(
            nodes,
            root,
            self.format,
            self.handlers.unwrap_or_default(),
        ))
    }
}

fn flatten_group(
    gb: GroupBuilder,
    order: u32,
    parent: Option<NodeId>,
    nodes: &mut Vec<DefNode>,
) -> ConfigResult<NodeId> {
    if let Occurs::Bounded(max) = gb.max_occurs {
        if gb.min_occurs > max {
            return Err(ConfigError::InvalidOccurs {
                owner: gb.name.clone(),
                min: gb.min_occurs,
                max,
            });
        }
    }

    let idx = nodes.len();
    nodes.push(DefNode {
        kind: NodeKind::Group(GroupDefinition {
            name: gb.name.clone(),
            children: Vec::new(),
            cohorts: Vec::new(),
        }),
        order,
        min_occurs: gb.min_occurs,
        max_occurs: gb.max_occurs,
        parent,
    });

    let mut seen = HashSet::new();
    let mut children = Vec::new();
    for (child_order, child) in gb.children {
        let name = match &child {
            NodeBuilder::Group(g) => g.name.clone(),
            NodeBuilder::Record(r) => r.name.clone(),
        };
        if !seen.insert(name.clone()) {
            return Err(ConfigError::DuplicateRecordName {
                group: gb.name.clone(),
                name,
            });
        }
        let child_idx = match child {
            NodeBuilder::Group(g) => flatten_group(g, child_order, Some(idx), nodes)?,
            NodeBuilder::Record(r) => flatten_record(r, child_order, Some(idx), nodes)?,
        };
        children.push(child_idx);
    }

    let cohorts = compute_cohorts(&children, nodes);
    validate_identifiers(&cohorts, nodes)?;

    if let NodeKind::Group(group) = &mut nodes[idx].kind {
        group.children = children;
        group.cohorts = cohorts;
    }

    Ok(idx)
}

fn flatten_record(
    rb: RecordBuilder,
    order: u32,
    parent: Option<NodeId>,
    nodes: &mut Vec<DefNode>,
) -> ConfigResult<NodeId> {
    if let Occurs::Bounded(max) = rb.max_occurs {
        if rb.min_occurs > max {
            return Err(ConfigError::InvalidOccurs {
                owner: rb.name.clone(),
                min: rb.min_occurs,
                max,
            });
        }
    }

    let mut fields = Vec::with_capacity(rb.fields.len());
    let mut occupied: Vec<(usize, usize)> = Vec::new();
    for fb in rb.fields {
        let field = fb.build(&rb.name)?;
        let extent = match field.collection {
            CollectionKind::Scalar => Some(1),
            CollectionKind::Array | CollectionKind::Sequence => match field.max_occurs {
                Occurs::Bounded(max) => Some(max.max(1)),
                Occurs::Unbounded => None,
            },
        };
        if let Some(extent) = extent {
            let start = field.position;
            let end = start + extent;
            for &(existing_start, existing_end) in &occupied {
                if start < existing_end && existing_start < end {
                    if end - start == 1 && existing_end - existing_start == 1 {
                        return Err(ConfigError::DuplicateFieldPosition {
                            record: rb.name.clone(),
                            field: field.name.clone(),
                            position: start,
                        });
                    }
                    return Err(ConfigError::OverlappingCollection {
                        record: rb.name.clone(),
                        field: field.name.clone(),
                        position: start,
                    });
                }
            }
            occupied.push((start, end));
        }
        fields.push(field);
    }

    let idx = nodes.len();
    nodes.push(DefNode {
        kind: NodeKind::Record(RecordDefinition {
            name: rb.name,
            min_occurs: rb.min_occurs,
            max_occurs: rb.max_occurs,
            fields,
            bean_factory: rb.bean_factory,
        }),
        order,
        min_occurs: rb.min_occurs,
        max_occurs: rb.max_occurs,
        parent,
    });
    Ok(idx)
}

fn compute_cohorts(children: &[NodeId], nodes: &[DefNode]) -> Vec<Vec<NodeId>> {
    let mut by_order: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
    for &id in children {
        by_order.entry(nodes[id].order).or_default().push(id);
    }
    by_order.into_values().collect()
}

fn validate_identifiers(cohorts: &[Vec<NodeId>], nodes: &[DefNode]) -> ConfigResult<()> {
    for cohort in cohorts {
        if cohort.len() <= 1 {
            continue;
        }
        for &id in cohort {
            if let NodeKind::Record(rec) = &nodes[id].kind {
                if !rec.has_identifiers() {
                    return Err(ConfigError::MissingIdentifier {
                        record: rec.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
