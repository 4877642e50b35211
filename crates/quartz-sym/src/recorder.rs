//! Bridges branch interception to tree insertion.
//!
//! The recorder owns the constraint tree and a cursor. Each branch
//! evaluation looks up (or creates) the child for the observed
//! predicate under the cursor, marks sibling pairs processed when both
//! sides have been seen, and advances the cursor. Newly created nodes
//! are collected in creation order for the engine to drain into its
//! work queue once the execution returns, so every node is enqueued
//! exactly once.

use std::rc::Rc;

use tracing::warn;

use crate::predicate::Predicate;
use crate::tree::{ConstraintTree, NodeId, ROOT};
use crate::value::{Bindings, Expr};
use crate::SymError;

pub struct PathRecorder {
    tree: ConstraintTree,
    cursor: NodeId,
    /// Root-exclusive ancestor chain of the expected terminal node,
    /// consumed leaf-upward as branches are replayed. Diagnostic only.
    expected_path: Option<Vec<Predicate>>,
    replay_diagnostics: bool,
    created: Vec<NodeId>,
    current_inputs: Bindings,
}

impl PathRecorder {
    pub fn new(replay_diagnostics: bool) -> Self {
        PathRecorder {
            tree: ConstraintTree::new(),
            cursor: ROOT,
            expected_path: None,
            replay_diagnostics,
            created: Vec::new(),
            current_inputs: Bindings::new(),
        }
    }

    pub fn tree(&self) -> &ConstraintTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConstraintTree {
        &mut self.tree
    }

    /// Reposition the cursor at the root for a fresh (sub-)execution.
    ///
    /// `inputs` is the binding set driving this execution; it is
    /// snapshotted into any node created while the execution runs. If
    /// an expected terminal node is supplied its ancestor-predicate
    /// chain becomes the replay checklist used for mismatch warnings —
    /// it never alters which nodes are created or how.
    pub fn reset(&mut self, inputs: Bindings, expected: Option<NodeId>) {
        self.cursor = ROOT;
        self.current_inputs = inputs;
        self.expected_path = expected.map(|node| {
            let mut chain = self.tree.ancestors_predicates(node);
            if let Some(p) = &self.tree.node(node).predicate {
                chain.push(p.clone());
            }
            // Consumed from the back, so store leaf-last reversed.
            chain.reverse();
            chain
        });
    }

    /// The branch-interception hook: called synchronously with the
    /// concrete outcome and the comparison expression, before the
    /// boolean is handed back to the target program.
    pub fn record_branch(&mut self, outcome: bool, expr: Rc<Expr>) -> Result<(), SymError> {
        let predicate = Predicate::new(expr, outcome);
        let sibling = self.tree.find_child(self.cursor, &predicate.negated());

        let node = match self.tree.find_child(self.cursor, &predicate) {
            Some(existing) => existing,
            None => {
                let id =
                    self.tree
                        .add_child(self.cursor, predicate, self.current_inputs.clone())?;
                self.created.push(id);
                id
            }
        };

        if self.replay_diagnostics {
            self.check_replay(node);
        }

        if let Some(neg) = sibling {
            // Both sides of this decision are now covered.
            self.tree.node_mut(neg).processed = true;
            self.tree.node_mut(node).processed = true;
        }

        self.cursor = node;
        Ok(())
    }

    fn check_replay(&mut self, node: NodeId) {
        let Some(chain) = self.expected_path.as_mut() else {
            return;
        };
        let Some(expected) = chain.pop() else {
            return;
        };
        let done = chain.is_empty();
        let actual = self.tree.node(node).predicate.as_ref();
        let outcome_matches = actual.map(|p| p.outcome) == Some(expected.outcome);
        // Before the terminal branch the replay must follow the chain;
        // at the terminal branch the solver was asked to flip it.
        if (!done && !outcome_matches) || (done && outcome_matches) {
            warn!(
                expected = %expected,
                actual = %actual.map(|p| p.to_string()).unwrap_or_default(),
                done,
                "replay mismatch"
            );
        }
    }

    /// Nodes created since the last drain, in creation order.
    pub fn take_created(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SymInt;

    fn branch(rec: &mut PathRecorder, name: &str, seed: i64, threshold: i64) {
        let v = SymInt::input(name, seed);
        let c = v.gt(&SymInt::literal(threshold));
        rec.record_branch(c.value, c.expr).unwrap();
    }

    #[test]
    fn identical_executions_reach_identical_nodes() {
        let mut rec = PathRecorder::new(false);
        rec.reset(Bindings::new(), None);
        branch(&mut rec, "x", 0, 10);
        branch(&mut rec, "y", 0, 5);
        let created = rec.take_created();
        assert_eq!(created.len(), 2);
        let shape = rec.tree().len();

        rec.reset(Bindings::new(), None);
        branch(&mut rec, "x", 0, 10);
        branch(&mut rec, "y", 0, 5);
        assert!(rec.take_created().is_empty());
        assert_eq!(rec.tree().len(), shape);
    }

    #[test]
    fn opposite_outcomes_mark_both_siblings_processed() {
        let mut rec = PathRecorder::new(false);
        rec.reset(Bindings::new(), None);
        branch(&mut rec, "x", 0, 10); // x > 10 : false
        let first = rec.take_created()[0];

        rec.reset(Bindings::new(), None);
        branch(&mut rec, "x", 20, 10); // x > 10 : true
        let second = rec.take_created()[0];

        assert!(rec.tree().node(first).processed);
        assert!(rec.tree().node(second).processed);
    }

    #[test]
    fn distinct_predicates_attach_at_the_same_position() {
        let mut rec = PathRecorder::new(false);
        rec.reset(Bindings::new(), None);
        branch(&mut rec, "x", 0, 10);

        rec.reset(Bindings::new(), None);
        branch(&mut rec, "y", 0, 10);

        // Two different expressions under the root, neither processed.
        let root_children = rec.tree().node(ROOT).children.clone();
        assert_eq!(root_children.len(), 2);
        assert!(root_children.iter().all(|&c| !rec.tree().node(c).processed));
    }

    #[test]
    fn created_nodes_carry_the_binding_snapshot() {
        let mut rec = PathRecorder::new(false);
        let mut inputs = Bindings::new();
        inputs.insert(
            "x".to_string(),
            crate::value::SymValue::Int(SymInt::input("x", 7)),
        );
        rec.reset(inputs, None);
        branch(&mut rec, "x", 7, 10);
        let id = rec.take_created()[0];
        let snap = rec.tree().node(id).inputs.as_ref().unwrap();
        assert_eq!(snap.get("x").and_then(|v| v.as_int()).unwrap().value, 7);
    }
}
