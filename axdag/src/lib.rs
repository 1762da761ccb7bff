//! Dataflow DAG model for instruction-set extension exploration.
//!
//! A [`Dag`] is a dense arena of tagged nodes with ordered operand lists
//! and derived successor lists. The normal form established here makes
//! structurally equivalent subgraphs spell identically:
//!
//!  - `Sub`/`Div` are rewritten into `Add`/`Mul` over an inverse wrapper,
//!  - associative operations are flattened so they never carry a
//!    same-typed operand,
//!  - operand positions 1 and 2 of non-commutative operations are wrapped
//!    in `Order1`/`Order2` labels so operand lists can be sorted freely,
//!  - operand lists are sorted by a total structural ordering.
//!
//! The referenced postfix writer then turns a normalized subgraph into its
//! canonical key, with `@n` back-references for shared subexpressions.

pub mod cost;
pub mod dag;
pub mod node;
pub mod perm;
mod rpn;

pub use dag::Dag;
pub use node::{Node, NodeId, Op, OpKind, Tile};
pub use perm::Permutations;
