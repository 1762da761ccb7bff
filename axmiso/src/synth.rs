//! Area accounting for a proposed instruction set.

use axdag::Dag;
use axdag::cost::area_cost;

/// Total silicon area of the given instruction DAGs: the area of every
/// node summed, literal sources included. Labels and inputs are free.
pub fn synthesize_area<'a, I>(dags: I) -> u64
where
    I: IntoIterator<Item = &'a Dag>,
{
    dags.into_iter()
        .flat_map(|dag| dag.iter())
        .map(|node| area_cost(&node.op))
        .sum()
}
