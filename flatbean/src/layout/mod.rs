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

//! The layout tree (§4.4): groups and records arranged as an arena of
//! [`DefNode`]s addressed by index rather than by owning reference, so a
//! record node's parent chain is a plain `usize` walk instead of a cycle.

mod traversal;

use crate::context::StreamFormat;
use crate::handler::TypeHandlerRegistry;
use crate::record::RecordDefinition;
use crate::value::Occurs;

pub use traversal::LayoutInstance;

/// An index into a [`MappingTree`]'s arena.
pub type NodeId = usize;

/// A group's identity plus its pre-computed order-cohort partition.
#[derive(Debug)]
pub struct GroupDefinition {
    pub name: String,
    /// Children in declaration order.
    pub children: Vec<NodeId>,
    /// `children` partitioned by ascending `order`, preserving declaration
    /// order within a cohort (§4.4 "sibling order cohorts").
    pub cohorts: Vec<Vec<NodeId>>,
}

/// Either arm of a layout node: a repeatable group of children, or a leaf
/// record definition.
#[derive(Debug)]
pub enum NodeKind {
    Group(GroupDefinition),
    Record(RecordDefinition),
}

impl NodeKind {
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Group(g) => &g.name,
            NodeKind::Record(r) => &r.name,
        }
    }
}

/// One arena slot: a node's own occurrence contract and its parent link.
#[derive(Debug)]
pub struct DefNode {
    pub kind: NodeKind,
    pub order: u32,
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    pub parent: Option<NodeId>,
}

/// A built, immutable layout: the arena plus the format and type-handler
/// registry it was built against. Shared read-only across reader/writer
/// instances (§5), typically behind an `Arc`.
#[derive(Debug)]
pub struct MappingTree {
    nodes: Vec<DefNode>,
    root: NodeId,
    pub format: StreamFormat,
    pub handlers: TypeHandlerRegistry,
}

impl MappingTree {
    pub(crate) fn new(nodes: Vec<DefNode>, root: NodeId, format: StreamFormat, handlers: TypeHandlerRegistry) -> Self {
        Self {
            nodes,
            root,
            format,
            handlers,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &DefNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The record definition at `id`, or `None` if it names a group.
    pub fn record(&self, id: NodeId) -> Option<&RecordDefinition> {
        match &self.nodes[id].kind {
            NodeKind::Record(r) => Some(r),
            NodeKind::Group(_) => None,
        }
    }

    /// An exhaustive, unordered search for a record definition matching
    /// `ctx` (§4.4 `matchAny`, used only to classify a failed `matchNext`
    /// as unidentified vs. unexpected).
    pub fn match_any(&self, ctx: &crate::context::RecordContext) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(id, node)| match &node.kind {
            NodeKind::Record(rec) if rec.matches_record(ctx) => Some(id),
            _ => None,
        })
    }
}
