//! Static delay and area tables, and critical-path costing.

use crate::dag::Dag;
use crate::node::{NodeId, Op};

/// Cost of one adder. Instruction costs are rounded up to a multiple of
/// this granularity.
pub const UNIT_COST: u64 = 100;

pub fn round_up_unit(cost: u64) -> u64 {
    cost.div_ceil(UNIT_COST) * UNIT_COST
}

/// Base delay of an operation. The inverses are priced so that inverse
/// plus base operation sums to the full subtract/divide delay. Leaves and
/// labels are free.
pub fn delay_cost(op: &Op) -> u64 {
    match op {
        Op::AddInv => 0,
        Op::MulInv => 200,
        Op::Add | Op::Sub => 100,
        Op::Mul => 300,
        Op::Div | Op::Rem => 500,
        Op::Shl | Op::LShr | Op::AShr => 20,
        Op::And | Op::Or | Op::Xor => 10,
        Op::Eq | Op::Ne => 10,
        Op::Gt | Op::Ge | Op::Lt | Op::Le => 100,
        Op::Select => 20,
        _ => 0,
    }
}

/// Area of an operation. Same table as [`delay_cost`], except literal
/// sources are charged for their storage.
pub fn area_cost(op: &Op) -> u64 {
    match op {
        Op::Const(_) => 10,
        other => delay_cost(other),
    }
}

impl Dag {
    /// Critical-path cost of every node: base delay plus the deepest
    /// operand, with associative operations paying one base delay per
    /// extra operand. Works for any arena layout; shared operands are
    /// costed once.
    pub fn accumulated_costs(&self) -> Vec<u64> {
        let mut costs: Vec<Option<u64>> = vec![None; self.len()];
        for id in self.ids() {
            self.cost_rec(id, &mut costs);
        }
        costs.into_iter().map(|c| c.unwrap_or(0)).collect()
    }

    fn cost_rec(&self, id: NodeId, costs: &mut Vec<Option<u64>>) -> u64 {
        if let Some(cost) = costs[id.0] {
            return cost;
        }
        let node = &self[id];
        let deepest = node
            .preds
            .iter()
            .map(|p| self.cost_rec(*p, costs))
            .max()
            .unwrap_or(0);
        let cost = if node.op.is_associative() {
            (node.preds.len().saturating_sub(1) as u64) * delay_cost(&node.op) + deepest
        } else {
            delay_cost(&node.op) + deepest
        };
        costs[id.0] = Some(cost);
        cost
    }
}
