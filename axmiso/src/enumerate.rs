//! Enumeration of MISO candidate instructions.
//!
//! For every node of a host DAG the enumerator extracts the depth-bounded
//! convex upper cone rooted there, walks every admissible subset containing
//! the root, and canonicalizes each candidate: a normalized copy is keyed
//! by its referenced RPN under every relabeling of its inputs, and the
//! lexicographically minimal key wins. Keys are deduplicated across roots;
//! each yielded candidate also attaches a [`Tile`] to its host root.

use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use log::debug;
use smallvec::{SmallVec, smallvec};

use axdag::{Dag, NodeId, Op, Permutations, Tile};

pub const DEFAULT_MAX_INPUT: usize = 2;
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Candidate-instruction enumerator with a shared key table.
#[derive(Debug)]
pub struct Enumerator {
    max_input: usize,
    max_depth: usize,
    /// Canonical keys in discovery order.
    keys: Vec<String>,
    /// Key to position in `keys`.
    indices: HashMap<String, usize>,
}

/// Per-root exploration state. `selected` and `inputs` never overlap.
struct Context {
    /// Upper cone in reverse topological order, root first.
    cone: Vec<NodeId>,
    /// Membership view of `cone`.
    in_cone: BTreeSet<NodeId>,
    /// Include/exclude decisions, parallel to `cone`.
    choices: Vec<bool>,
    selected: BTreeSet<NodeId>,
    inputs: BTreeSet<NodeId>,
}

impl Enumerator {
    pub fn new(max_input: usize, max_depth: usize) -> Self {
        Enumerator {
            max_input,
            max_depth,
            keys: Vec::new(),
            indices: HashMap::new(),
        }
    }

    /// Canonical keys discovered so far, in first-seen order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Position of a key in the table, if it has been discovered.
    pub fn key_index(&self, key: &str) -> Option<usize> {
        self.indices.get(key).copied()
    }

    /// Runs the exploration over every root of `dag`, attaching candidate
    /// tiles to the host nodes as a side effect. The DAG must have its
    /// successor lists propagated.
    ///
    /// The host is rewritten once up front so subtraction and division
    /// spell as their inverse forms; candidates then select over `Add`
    /// and `Mul` plus inverse wrappers.
    pub fn enumerate(&mut self, dag: &mut Dag) {
        let count = dag.len();
        for i in 0..count {
            dag.to_associative(NodeId(i));
        }
        dag.propagate_succ();

        // Inverse wrappers live past the original id range, so
        // topological positions are computed explicitly.
        let order = dag.topo_order();
        let mut rank = vec![0usize; dag.len()];
        for (pos, id) in order.iter().enumerate() {
            rank[id.0] = pos;
        }

        for i in 0..dag.len() {
            let root = NodeId(i);
            let cone = upper_cone(dag, root, &rank, self.max_depth);
            if cone.is_empty() {
                continue;
            }
            debug!("root {}: upper cone of {} nodes", root, cone.len());
            let mut ctx = Context {
                in_cone: cone.iter().copied().collect(),
                cone,
                // The root is always part of the candidate.
                choices: vec![true],
                selected: BTreeSet::new(),
                inputs: BTreeSet::new(),
            };
            self.recurse(dag, &mut ctx, &rank);
        }
    }

    fn recurse(&mut self, dag: &mut Dag, ctx: &mut Context, rank: &[usize]) {
        let level = ctx.choices.len() - 1;
        let node = ctx.cone[level];
        let choice = ctx.choices[level];
        let mut new_inputs: SmallVec<[NodeId; 4]> = SmallVec::new();
        let mut was_input = false;

        if choice {
            // Every selected node except the root must keep all of its
            // users inside the candidate.
            if level > 0 && !convex_and_not_output(dag, node, &ctx.selected) {
                return;
            }

            for p in dag[node].preds.clone() {
                if ctx.inputs.insert(p) {
                    new_inputs.push(p);
                }
            }
            if ctx.inputs.remove(&node) {
                was_input = true;
            }
            ctx.selected.insert(node);

            // Inputs outside the cone can never be absorbed by a later
            // include; once they exceed the bound the branch is dead.
            let mandatory = ctx
                .inputs
                .iter()
                .filter(|p| !ctx.in_cone.contains(p))
                .count();
            if mandatory > self.max_input {
                restore(ctx, node, &new_inputs, was_input);
                return;
            }

            if ctx.inputs.len() <= self.max_input && ctx.selected.len() >= 2 {
                self.yield_candidate(dag, ctx, rank);
            }
        }

        if ctx.choices.len() < ctx.cone.len() {
            ctx.choices.push(true);
            self.recurse(dag, ctx, rank);
            ctx.choices.pop();
            ctx.choices.push(false);
            self.recurse(dag, ctx, rank);
            ctx.choices.pop();
        }

        if choice {
            restore(ctx, node, &new_inputs, was_input);
        }
    }

    /// Copies the current candidate, normalizes it, and records the
    /// minimal key over all input relabelings.
    fn yield_candidate(&mut self, dag: &mut Dag, ctx: &Context, rank: &[usize]) {
        // Fresh copy of inputs and selected nodes. Both sets are walked
        // in topological order so every operand is mapped before its
        // user.
        let mut input_order: Vec<NodeId> = ctx.inputs.iter().copied().collect();
        input_order.sort_by_key(|id| rank[id.0]);
        let mut selected_order: Vec<NodeId> = ctx.selected.iter().copied().collect();
        selected_order.sort_by_key(|id| rank[id.0]);

        let mut map: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut copy = Dag::new();
        let mut copy_inputs: Vec<NodeId> = Vec::with_capacity(input_order.len());
        for &old in &input_order {
            // Placeholder, relabeled per permutation below.
            let id = copy.add(Op::Unknown);
            map.insert(old, id);
            copy_inputs.push(id);
        }
        for &old in &selected_order {
            let preds: SmallVec<[NodeId; 2]> = dag[old].preds.iter().map(|p| map[p]).collect();
            let id = copy.add_with(dag[old].op.clone(), preds);
            map.insert(old, id);
        }
        let root = map[&ctx.cone[0]];
        copy.normalize();

        // Candidates with no inputs still yield once, with the empty
        // relabeling.
        let mut best_key: Option<String> = None;
        let mut best_perm: Vec<usize> = Vec::new();
        let mut perms = Permutations::new(copy_inputs.len());
        while let Some(perm) = perms.next() {
            for (slot, &input) in copy_inputs.iter().enumerate() {
                copy[input].op = Op::Input(perm[slot] as u32 + 1);
            }
            copy.sort_subgraph(root);
            let key = copy.ref_rpn(root);
            if best_key.as_deref().is_none_or(|best| key.as_str() < best) {
                best_key = Some(key);
                best_perm = perm.to_vec();
            }
        }
        let Some(key) = best_key else { return };

        // Slot i of the candidate became input number best_perm[i] + 1,
        // so the host operand for slot i lands at tile position
        // best_perm[i].
        let mut operands: SmallVec<[NodeId; 2]> = smallvec![NodeId(0); input_order.len()];
        for (slot, &host) in input_order.iter().enumerate() {
            operands[best_perm[slot]] = host;
        }
        let tile = Tile {
            rpn: key.clone(),
            cost: 0,
            operands,
            covered: selected_order.iter().copied().collect(),
        };
        dag[ctx.cone[0]].tiles.push(tile);

        if !self.indices.contains_key(&key) {
            self.indices.insert(key.clone(), self.keys.len());
            self.keys.push(key);
        }
    }
}

fn restore(ctx: &mut Context, node: NodeId, new_inputs: &[NodeId], was_input: bool) {
    ctx.selected.remove(&node);
    for p in new_inputs {
        ctx.inputs.remove(p);
    }
    if was_input {
        ctx.inputs.insert(node);
    }
}

/// Whether `node` can join a candidate with the given selection: a
/// non-constant must have every user selected already (it would otherwise
/// be a second output), a constant needs at least one selected user and is
/// never itself an output.
fn convex_and_not_output(dag: &Dag, node: NodeId, selected: &BTreeSet<NodeId>) -> bool {
    if dag[node].op.is_const() {
        dag[node].succs.iter().any(|s| selected.contains(s))
    } else {
        dag[node].succs.iter().all(|s| selected.contains(s))
    }
}

/// Extracts the depth-bounded convex upper cone of `root`, in reverse
/// topological order with the root first.
///
/// Candidates pop latest-in-topological-order first, so by the time a
/// node is considered every one of its users has already been accepted or
/// rejected, and its depth is final.
fn upper_cone(dag: &Dag, root: NodeId, rank: &[usize], max_depth: usize) -> Vec<NodeId> {
    if dag[root].op.is_unknown() {
        return Vec::new();
    }

    let mut cone = Vec::new();
    let mut selected: BTreeSet<NodeId> = BTreeSet::new();
    let mut depth: HashMap<NodeId, usize> = HashMap::new();
    let mut candidates: BinaryHeap<(usize, NodeId)> = BinaryHeap::new();

    cone.push(root);
    selected.insert(root);
    depth.insert(root, 0);
    push_preds(dag, root, 0, rank, &mut candidates, &mut depth);

    while let Some((_, node)) = candidates.pop() {
        if selected.contains(&node) {
            continue;
        }
        if !convex_and_not_output(dag, node, &selected) {
            continue;
        }
        let d = depth[&node];
        if d > max_depth {
            continue;
        }

        cone.push(node);
        selected.insert(node);
        push_preds(dag, node, d, rank, &mut candidates, &mut depth);
    }
    cone
}

fn push_preds(
    dag: &Dag,
    node: NodeId,
    node_depth: usize,
    rank: &[usize],
    candidates: &mut BinaryHeap<(usize, NodeId)>,
    depth: &mut HashMap<NodeId, usize>,
) {
    for &p in &dag[node].preds {
        if dag[p].op.is_unknown() {
            continue;
        }
        candidates.push((rank[p.0], p));
        let entry = depth.entry(p).or_insert(0);
        *entry = (*entry).max(node_depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(dag: &Dag) -> Vec<usize> {
        let order = dag.topo_order();
        let mut rank = vec![0usize; dag.len()];
        for (pos, id) in order.iter().enumerate() {
            rank[id.0] = pos;
        }
        rank
    }

    // Chain x -> op1 -> op2 -> ... with a single leaf.
    fn add_chain(len: usize) -> (Dag, NodeId) {
        let mut dag = Dag::new();
        let mut last = dag.add(Op::Const("1".into()));
        for _ in 0..len {
            last = dag.add_with(Op::Add, [last]);
        }
        dag.propagate_succ();
        (dag, last)
    }

    #[test]
    fn upper_cone_respects_depth_bound() {
        let (dag, root) = add_chain(10);
        let rank = ranks(&dag);
        let cone = upper_cone(&dag, root, &rank, 3);
        assert_eq!(cone.len(), 4);
        assert_eq!(cone[0], root);
    }

    #[test]
    fn upper_cone_of_unknown_root_is_empty() {
        let mut dag = Dag::new();
        let unk = dag.add(Op::Unknown);
        dag.propagate_succ();
        let rank = ranks(&dag);
        assert!(upper_cone(&dag, unk, &rank, 10).is_empty());
    }

    #[test]
    fn upper_cone_stops_at_outside_users() {
        // shared feeds both the root and an outside consumer, so it must
        // stay outside the cone.
        let mut dag = Dag::new();
        let a = dag.add(Op::Const("3".into()));
        let shared = dag.add_with(Op::Mul, [a, a]);
        let root = dag.add_with(Op::Add, [shared, a]);
        let _outside = dag.add_with(Op::Xor, [shared, shared]);
        dag.propagate_succ();

        let rank = ranks(&dag);
        let cone = upper_cone(&dag, root, &rank, 10);
        assert!(!cone.contains(&shared));
        assert_eq!(cone[0], root);
    }
}
