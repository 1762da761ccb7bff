//! Cost-optimal tiling of a block DAG against an instruction library.

use std::collections::{BTreeSet, HashMap, VecDeque};

use log::debug;
use smallvec::smallvec;

use axdag::cost::{delay_cost, round_up_unit};
use axdag::{Dag, NodeId, Op, Tile};

use crate::enumerate::{DEFAULT_MAX_DEPTH, Enumerator};

/// Instruction library plus the dynamic-programming matcher.
///
/// Instructions are registered up front with [`Selector::add_instr`]; each
/// [`Selector::select`] call then re-enumerates the candidate tiles of a
/// block, keeps those backed by the library, and realizes the covering of
/// minimal total cost.
#[derive(Debug, Default)]
pub struct Selector {
    /// Canonical key to rounded critical-path cost.
    library: HashMap<String, u64>,
    /// Largest input count over the registered instructions; the
    /// enumeration bound for matching.
    max_input: usize,
}

impl Selector {
    pub fn new() -> Self {
        Selector::default()
    }

    pub fn instruction_count(&self) -> usize {
        self.library.len()
    }

    pub fn max_input(&self) -> usize {
        self.max_input
    }

    /// Registers one instruction. The DAG must already be legalized; its
    /// canonical key is recomputed here and its cost is the critical path
    /// rounded up to the unit granularity.
    pub fn add_instr(&mut self, dag: &Dag, root: NodeId) {
        let key = dag.ref_rpn(root);
        let costs = dag.accumulated_costs();
        let cost = round_up_unit(costs[root.0]);

        // Distinct input slots; a shared input referenced twice counts once.
        let inputs: BTreeSet<u32> = dag
            .iter()
            .filter_map(|node| match node.op {
                Op::Input(k) => Some(k),
                _ => None,
            })
            .collect();
        self.max_input = self.max_input.max(inputs.len());

        debug!("instruction `{}`: cost {}", key, cost);
        self.library.insert(key, cost);
    }

    /// Tiles `dag` at minimal total cost and returns the static execution
    /// time of the realized covering.
    pub fn select(&self, dag: &mut Dag) -> u64 {
        for id in 0..dag.len() {
            dag[NodeId(id)].tiles.clear();
        }
        let mut enumerator = Enumerator::new(self.max_input, DEFAULT_MAX_DEPTH);
        enumerator.enumerate(dag);

        // Keep the tiles backed by the library and price them; every node
        // additionally gets the fallback of executing as a bare operation.
        for i in 0..dag.len() {
            let id = NodeId(i);
            let mut tiles = std::mem::take(&mut dag[id].tiles);
            tiles.retain_mut(|tile| match self.library.get(&tile.rpn) {
                Some(&cost) => {
                    tile.cost = cost;
                    true
                }
                None => false,
            });
            let fallback = match &dag[id].op {
                Op::Unknown => 0,
                op => round_up_unit(delay_cost(op)),
            };
            tiles.push(Tile {
                rpn: String::new(),
                cost: fallback,
                operands: dag[id].preds.clone(),
                covered: smallvec![id],
            });
            dag[id].tiles = tiles;
        }

        // Bottom-up: cheapest way of producing every value. The host may
        // carry inverse wrappers past the original id range, so the sweep
        // follows the computed topological order.
        let mut min_cost = vec![0u64; dag.len()];
        let mut best = vec![0usize; dag.len()];
        for id in dag.topo_order() {
            let mut best_at = 0usize;
            let mut cheapest = u64::MAX;
            for (t, tile) in dag[id].tiles.iter().enumerate() {
                let cost = tile.cost
                    + tile
                        .operands
                        .iter()
                        .map(|operand| min_cost[operand.0])
                        .sum::<u64>();
                if cost < cheapest {
                    cheapest = cost;
                    best_at = t;
                }
            }
            min_cost[id.0] = cheapest;
            best[id.0] = best_at;
        }

        // Top-down: realize tiles starting from the values that leave the
        // block; everything a chosen tile consumes is realized in turn.
        let mut matched = vec![false; dag.len()];
        let mut queue: VecDeque<NodeId> =
            dag.ids().filter(|id| dag[*id].succs.is_empty()).collect();
        let mut total = 0u64;
        while let Some(id) = queue.pop_front() {
            if matched[id.0] {
                continue;
            }
            matched[id.0] = true;
            let tile = &dag[id].tiles[best[id.0]];
            total += tile.cost;
            for &operand in &tile.operands {
                queue.push_back(operand);
            }
        }

        debug!("selected covering costs {}", total);
        total
    }
}
