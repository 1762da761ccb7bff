//! Dense-arena DAG and its structural rewrites.

use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use crate::node::{Node, NodeId, Op};

/// A dataflow DAG stored as a dense arena of nodes.
///
/// Freshly built graphs keep operands at smaller ids than their users, so
/// plain id order doubles as a topological order. The rewrites below append
/// auxiliary nodes (inverse wrappers, order labels) past the original
/// range; such nodes are only reachable through the rewritten operand
/// edges. [`Dag::topo_order`] recovers a true topological order for
/// arenas that have been rewritten.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    nodes: Vec<Node>,
}

impl Dag {
    pub fn new() -> Self {
        Dag { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Appends a leaf node.
    pub fn add(&mut self, op: Op) -> NodeId {
        self.add_with(op, [])
    }

    /// Appends a node with the given operands.
    pub fn add_with<I>(&mut self, op: Op, preds: I) -> NodeId
    where
        I: IntoIterator<Item = NodeId>,
    {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(op);
        node.preds = preds.into_iter().collect();
        self.nodes.push(node);
        id
    }

    /// Rebuilds every successor list from the operand edges, so that
    /// `succs(n)` is exactly the multiset of users of `n`.
    pub fn propagate_succ(&mut self) {
        for node in &mut self.nodes {
            node.succs.clear();
        }
        for i in 0..self.nodes.len() {
            let preds = self.nodes[i].preds.clone();
            for p in preds {
                self.nodes[p.0].succs.push(NodeId(i));
            }
        }
    }

    /// Rewrites `Sub` into `Add` and `Div` into `Mul` by wrapping the
    /// second operand in the matching inverse. The wrapper is appended to
    /// the arena.
    ///
    /// Note: call this only after the node's operand list is complete.
    pub fn to_associative(&mut self, id: NodeId) {
        let (base, inv) = match self[id].op {
            Op::Sub => (Op::Add, Op::AddInv),
            Op::Div => (Op::Mul, Op::MulInv),
            _ => return,
        };
        let second = self[id].preds[1];
        let wrapper = self.add_with(inv, [second]);
        self[id].op = base;
        self[id].preds[1] = wrapper;
    }

    /// Flattens same-typed operands of associative operations into the
    /// current node, and wraps operand positions 1 and 2 of ordered
    /// operations in `Order1`/`Order2` labels.
    ///
    /// A folded operand keeps its own operand list but no user points at it
    /// any more, which marks it unreachable. New label nodes are appended
    /// to the arena.
    ///
    /// Note: this method is not recursive. Call it in topological order.
    pub fn relax_order(&mut self, id: NodeId) {
        let op = self[id].op.clone();
        if op.is_associative() {
            let preds = std::mem::take(&mut self[id].preds);
            let mut flat: SmallVec<[NodeId; 2]> = SmallVec::new();
            for p in preds {
                if self[p].op == op {
                    flat.extend(self[p].preds.iter().copied());
                } else {
                    flat.push(p);
                }
            }
            self[id].preds = flat;
        } else if op.is_ordered() {
            for pos in 1..self[id].preds.len().min(3) {
                let operand = self[id].preds[pos];
                let label = if pos == 1 { Op::Order1 } else { Op::Order2 };
                let wrapper = self.add_with(label, [operand]);
                self[id].preds[pos] = wrapper;
            }
        }
    }

    /// Full normal form: the associative rewrite, then operand flattening
    /// and order labels, then fresh successor lists.
    pub fn normalize(&mut self) {
        let count = self.nodes.len();
        for i in 0..count {
            self.to_associative(NodeId(i));
        }
        for i in 0..count {
            self.relax_order(NodeId(i));
        }
        self.propagate_succ();
    }

    /// Legalizes a parsed instruction DAG: operand flattening and order
    /// labels plus successor lists, without the associative rewrite (the
    /// exchange format may legitimately spell `-` and `/`).
    pub fn legalize(&mut self) {
        let count = self.nodes.len();
        for i in 0..count {
            self.relax_order(NodeId(i));
        }
        self.propagate_succ();
    }

    /// Topological order over the whole arena, operands first. Tolerant
    /// of auxiliary nodes appended out of id order by the rewrites.
    pub fn topo_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut visited = vec![false; self.len()];
        for id in self.ids() {
            self.topo_rec(id, &mut visited, &mut order);
        }
        order
    }

    fn topo_rec(&self, id: NodeId, visited: &mut [bool], order: &mut Vec<NodeId>) {
        if visited[id.0] {
            return;
        }
        visited[id.0] = true;
        for &p in &self[id].preds {
            self.topo_rec(p, visited, order);
        }
        order.push(id);
    }

    /// Total structural ordering.
    ///
    /// Ranks decide across kinds (leaves first, labels last); same-kind
    /// constants compare by their literal spelling, and otherwise equal
    /// kinds compare operand-by-operand with the shorter list winning on a
    /// common prefix.
    pub fn cmp_structure(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let (na, nb) = (&self[a], &self[b]);
        match na.op.rank().cmp(&nb.op.rank()) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        if let (Op::Const(va), Op::Const(vb)) = (&na.op, &nb.op) {
            return va.cmp(vb);
        }
        for (pa, pb) in na.preds.iter().zip(nb.preds.iter()) {
            match self.cmp_structure(*pa, *pb) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        na.preds.len().cmp(&nb.preds.len())
    }

    /// Sorts the operand list of one node by [`Dag::cmp_structure`].
    /// Requires the operands themselves to be sorted already.
    pub fn sort_preds(&mut self, id: NodeId) {
        let mut preds = std::mem::take(&mut self[id].preds);
        preds.sort_by(|a, b| self.cmp_structure(*a, *b));
        self[id].preds = preds;
    }

    /// Sorts every node reachable from `root`, operands before users.
    pub fn sort_subgraph(&mut self, root: NodeId) {
        let mut visited = vec![false; self.nodes.len()];
        self.sort_rec(root, &mut visited);
    }

    fn sort_rec(&mut self, id: NodeId, visited: &mut [bool]) {
        if visited[id.0] {
            return;
        }
        visited[id.0] = true;
        let preds = self[id].preds.clone();
        for p in preds {
            self.sort_rec(p, visited);
        }
        self.sort_preds(id);
    }

    /// One-line-per-node dump, mainly for trace logging.
    pub fn display(&self) -> impl std::fmt::Display + '_ {
        struct Fmt<'a>(&'a Dag);

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                for id in self.0.ids() {
                    let node = &self.0[id];
                    write!(f, "{} = {}", id, node.op)?;
                    for p in &node.preds {
                        write!(f, " {}", p)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
        }

        Fmt(self)
    }
}

impl Index<NodeId> for Dag {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Dag {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
