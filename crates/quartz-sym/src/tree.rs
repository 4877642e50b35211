//! The constraint tree: one node per distinct branch-decision-path
//! prefix reached so far.
//!
//! Nodes live in a growable arena and refer to each other by index, so
//! there is no cyclic ownership and the exploration engine can hold a
//! `NodeId` across executions for free. The tree only ever grows; a
//! node's ancestor chain is the unique sequence of predicates that must
//! all hold for that node to be reached.

use num_complex::Complex64;

use crate::predicate::Predicate;
use crate::value::Bindings;
use crate::SymError;

/// Arena index of a constraint node. Doubles as the monotonic creation
/// id used for ordering and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

pub const ROOT: NodeId = NodeId(0);

#[derive(Debug)]
pub struct ConstraintNode {
    /// `None` only for the root sentinel.
    pub predicate: Option<Predicate>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Both sides of this decision have been covered, or the node has
    /// been drained and solved.
    pub processed: bool,
    /// Snapshot of the binding set active when the node was created;
    /// restored to replay execution up to this point.
    pub inputs: Option<Bindings>,
    /// Quantum-branch retry bookkeeping: initial amplitude vectors the
    /// solver already proposed that failed to produce a new behavior.
    pub unaccepted_results: Vec<Vec<Complex64>>,
}

pub struct ConstraintTree {
    nodes: Vec<ConstraintNode>,
}

impl ConstraintTree {
    pub fn new() -> Self {
        ConstraintTree {
            nodes: vec![ConstraintNode {
                predicate: None,
                parent: None,
                children: Vec::new(),
                processed: false,
                inputs: None,
                unaccepted_results: Vec::new(),
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root sentinel is always present.
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &ConstraintNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ConstraintNode {
        &mut self.nodes[id.0]
    }

    /// Linear structural lookup among `parent`'s children.
    pub fn find_child(&self, parent: NodeId, predicate: &Predicate) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].predicate.as_ref() == Some(predicate))
    }

    /// Create a child node. Inserting a predicate that already has a
    /// matching child is a modeling contract violation.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        predicate: Predicate,
        inputs: Bindings,
    ) -> Result<NodeId, SymError> {
        if self.find_child(parent, &predicate).is_some() {
            return Err(SymError::DuplicatePredicate(parent.0));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(ConstraintNode {
            predicate: Some(predicate),
            parent: Some(parent),
            children: Vec::new(),
            processed: false,
            inputs: Some(inputs),
            unaccepted_results: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Predicates of all strict ancestors, oldest-first, excluding the
    /// root sentinel. This is the "asserts" list for solving `node`.
    pub fn ancestors_predicates(&self, node: NodeId) -> Vec<Predicate> {
        let mut preds = Vec::new();
        let mut cur = self.nodes[node.0].parent;
        while let Some(id) = cur {
            if let Some(p) = &self.nodes[id.0].predicate {
                preds.push(p.clone());
            }
            cur = self.nodes[id.0].parent;
        }
        preds.reverse();
        preds
    }

    /// Distance from the root sentinel.
    pub fn depth(&self, node: NodeId) -> usize {
        let mut d = 0;
        let mut cur = self.nodes[node.0].parent;
        while let Some(id) = cur {
            d += 1;
            cur = self.nodes[id.0].parent;
        }
        d
    }
}

impl Default for ConstraintTree {
    fn default() -> Self {
        Self::new()
    }
}
