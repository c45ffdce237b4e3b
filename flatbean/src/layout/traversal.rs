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

//! Runtime traversal of a [`MappingTree`] (§4.4): `matchNext`/`close`,
//! tracked as a parallel array of per-node counters rather than mutating
//! the (shared, immutable) tree itself.

use std::sync::Arc;

use crate::context::RecordContext;

use super::{MappingTree, NodeId, NodeKind};

/// Per-node runtime state. Only groups use `cohort_cursor`/`in_progress`/
/// `started`; records are matched atomically and never need them.
#[derive(Clone, Copy, Default, Debug)]
struct NodeState {
    current: usize,
    cohort_cursor: usize,
    in_progress: Option<usize>,
    /// Whether the group's current iteration has matched at least once,
    /// i.e. whether `current` already counts it.
    started: bool,
}

/// One reader's (or writer's) live position inside a shared [`MappingTree`].
///
/// Cloning the tree is cheap (it's behind an `Arc`); cloning the instance
/// gives an independent cursor over the same definitions.
#[derive(Clone, Debug)]
pub struct LayoutInstance {
    tree: Arc<MappingTree>,
    state: Vec<NodeState>,
}

impl LayoutInstance {
    pub fn new(tree: Arc<MappingTree>) -> Self {
        let state = vec![NodeState::default(); tree.len()];
        Self { tree, state }
    }

    pub fn tree(&self) -> &Arc<MappingTree> {
        &self.tree
    }

    /// `matchNext(record)` (§4.4): walks the tree depth-first in cohort
    /// order, honouring in-progress continuation and the
    /// identifier-before-anonymous tie-break. Returns the matched record's
    /// node id, or `None` if nothing reachable from the root matches.
    pub fn match_next(&mut self, ctx: &RecordContext) -> Option<NodeId> {
        let root = self.tree.root();
        self.enter_group(root, ctx)
    }

    /// How many times `id` has matched (or, for a group, how many
    /// iterations it has started) so far.
    pub fn current(&self, id: NodeId) -> usize {
        self.state[id].current
    }

    /// `close()` (§4.4): a post-order walk that returns the first node
    /// whose `current` hasn't reached its `min_occurs`, or `None` if every
    /// node in the tree is satisfied.
    pub fn close(&self) -> Option<NodeId> {
        self.close_subtree(self.tree.root())
    }

    fn close_subtree(&self, id: NodeId) -> Option<NodeId> {
        if let NodeKind::Group(group) = &self.tree.node(id).kind {
            for &child in &group.children {
                if let Some(unsatisfied) = self.close_subtree(child) {
                    return Some(unsatisfied);
                }
            }
        }
        if self.state[id].current < self.tree.node(id).min_occurs {
            return Some(id);
        }
        None
    }

    fn at_capacity(&self, id: NodeId) -> bool {
        !self.tree.node(id).max_occurs.allows(self.state[id].current + 1)
    }

    fn is_identifier_bearing(&self, id: NodeId) -> bool {
        match &self.tree.node(id).kind {
            NodeKind::Record(rec) => rec.has_identifiers(),
            NodeKind::Group(_) => false,
        }
    }

    fn cohort_satisfied(&self, cohort: &[NodeId]) -> bool {
        cohort
            .iter()
            .all(|&id| self.state[id].current >= self.tree.node(id).min_occurs)
    }

    /// Resets a subtree's runtime counters ahead of a fresh group
    /// iteration (§4.4: occurrence counters are scoped to one pass through
    /// the owning group, not cumulative across its repeats).
    fn reset_subtree(&mut self, id: NodeId) {
        self.state[id] = NodeState::default();
        if let NodeKind::Group(group) = &self.tree.node(id).kind {
            let children = group.children.clone();
            for child in children {
                self.reset_subtree(child);
            }
        }
    }

    fn mark_started(&mut self, id: NodeId) {
        if !self.state[id].started {
            self.state[id].started = true;
            self.state[id].current += 1;
        }
    }

    /// Attempts to match `ctx` against `id`: a record matches atomically;
    /// a group recurses into `enter_group`. Returns the matched record's
    /// node id on success.
    fn try_child(&mut self, id: NodeId, ctx: &RecordContext) -> Option<NodeId> {
        match &self.tree.node(id).kind {
            NodeKind::Record(rec) => {
                if self.at_capacity(id) || !rec.matches_record(ctx) {
                    return None;
                }
                self.state[id].current += 1;
                Some(id)
            }
            NodeKind::Group(_) => {
                if !self.state[id].started && self.at_capacity(id) {
                    return None;
                }
                self.enter_group(id, ctx)
            }
        }
    }

    fn enter_group(&mut self, id: NodeId, ctx: &RecordContext) -> Option<NodeId> {
        loop {
            let cohort_count = match &self.tree.node(id).kind {
                NodeKind::Group(group) => group.cohorts.len(),
                NodeKind::Record(_) => unreachable!("enter_group called on a record node"),
            };
            let cursor = self.state[id].cohort_cursor;

            if cursor >= cohort_count {
                // The iteration just completed. Only reset the children's
                // counters if another iteration is actually going to be
                // attempted — otherwise `close()` would see a spuriously
                // unsatisfied child from an iteration that in fact
                // completed fine.
                if self.at_capacity(id) {
                    self.state[id].started = false;
                    return None;
                }
                self.state[id].started = false;
                self.state[id].cohort_cursor = 0;
                self.state[id].in_progress = None;
                self.reset_subtree_children(id);
                continue;
            }

            let cohort = match &self.tree.node(id).kind {
                NodeKind::Group(group) => group.cohorts[cursor].clone(),
                NodeKind::Record(_) => unreachable!(),
            };

            if let Some(ip) = self.state[id].in_progress {
                let child = cohort[ip];
                if let Some(matched) = self.try_child(child, ctx) {
                    self.mark_started(id);
                    return Some(matched);
                }
                self.state[id].in_progress = None;
            }

            let mut found = None;
            for prefer_identifiers in [true, false] {
                for (pos, &child) in cohort.iter().enumerate() {
                    if Some(pos) == self.state[id].in_progress {
                        continue;
                    }
                    if self.is_identifier_bearing(child) != prefer_identifiers {
                        continue;
                    }
                    if let Some(matched) = self.try_child(child, ctx) {
                        found = Some((pos, matched));
                        break;
                    }
                }
                if found.is_some() {
                    break;
                }
            }

            if let Some((pos, matched)) = found {
                self.mark_started(id);
                self.state[id].in_progress = if self.at_capacity(cohort[pos]) {
                    None
                } else {
                    Some(pos)
                };
                return Some(matched);
            }

            if self.cohort_satisfied(&cohort) {
                self.state[id].cohort_cursor += 1;
                self.state[id].in_progress = None;
                continue;
            }

            return None;
        }
    }

    fn reset_subtree_children(&mut self, id: NodeId) {
        if let NodeKind::Group(group) = &self.tree.node(id).kind {
            let children = group.children.clone();
            for child in children {
                self.reset_subtree(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FieldBuilder, GroupBuilder, MappingBuilder, RecordBuilder};
    use crate::context::StreamFormat;
    use crate::value::Occurs;

    fn ctx(text: &str) -> RecordContext {
        RecordContext::new(1, text.to_owned(), vec![text.to_owned()], StreamFormat::Csv)
    }

    fn id_field(literal: &str) -> FieldBuilder {
        FieldBuilder::new("kind", 0).identifier(true).literal(literal)
    }

    fn htd_tree() -> MappingTree {
        MappingBuilder::new(StreamFormat::Csv)
            .record(0, RecordBuilder::new("header").occurs(1, Occurs::Bounded(1)).field(id_field("H")))
            .record(1, RecordBuilder::new("detail").occurs(0, Occurs::Unbounded).field(id_field("D")))
            .record(2, RecordBuilder::new("trailer").occurs(1, Occurs::Bounded(1)).field(id_field("T")))
            .build()
            .unwrap()
    }

    #[test]
    fn matches_sequential_cohorts_in_order() {
        let mut instance = LayoutInstance::new(Arc::new(htd_tree()));
        instance.match_next(&ctx("H")).expect("header matches");
        let detail_id = instance.match_next(&ctx("D")).expect("detail matches");
        assert_eq!(instance.match_next(&ctx("D")).unwrap(), detail_id);
        instance.match_next(&ctx("T")).expect("trailer matches");
        assert!(instance.close().is_none());
    }

    #[test]
    fn record_out_of_its_cohort_does_not_match() {
        let mut instance = LayoutInstance::new(Arc::new(htd_tree()));
        // "D" can't match before the mandatory header cohort is satisfied.
        assert!(instance.match_next(&ctx("D")).is_none());
    }

    #[test]
    fn close_reports_the_first_unsatisfied_node() {
        let mut instance = LayoutInstance::new(Arc::new(htd_tree()));
        instance.match_next(&ctx("H")).unwrap();
        instance.match_next(&ctx("D")).unwrap();
        let unsatisfied = instance.close().expect("trailer never arrived");
        assert_eq!(instance.tree().node(unsatisfied).kind.name(), "trailer");
    }

    #[test]
    fn identified_cohort_siblings_are_distinguished_by_literal() {
        let tree = MappingBuilder::new(StreamFormat::Csv)
            .record(0, RecordBuilder::new("a").field(id_field("A")))
            .record(0, RecordBuilder::new("b").field(id_field("B")))
            .build()
            .unwrap();
        let mut instance = LayoutInstance::new(Arc::new(tree));
        let a = instance.match_next(&ctx("A")).unwrap();
        let b = instance.match_next(&ctx("B")).unwrap();
        assert_ne!(a, b);
        assert_eq!(instance.tree().node(a).kind.name(), "a");
        assert_eq!(instance.tree().node(b).kind.name(), "b");
    }

    #[test]
    fn repeating_group_resets_children_each_iteration_and_respects_its_own_max() {
        let tree = MappingBuilder::new(StreamFormat::Csv)
            .group(
                0,
                GroupBuilder::new("segment").occurs(1, Occurs::Bounded(2)).record(
                    0,
                    RecordBuilder::new("line").occurs(1, Occurs::Bounded(1)).field(FieldBuilder::new("id", 0)),
                ),
            )
            .build()
            .unwrap();
        let mut instance = LayoutInstance::new(Arc::new(tree));
        assert!(instance.match_next(&ctx("x")).is_some());
        assert!(instance.match_next(&ctx("x")).is_some());
        assert!(instance.match_next(&ctx("x")).is_none());
        assert!(instance.close().is_none());
    }
}
