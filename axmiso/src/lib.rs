//! MISO candidate enumeration, instruction selection and area synthesis.
//!
//! A MISO (multiple-input single-output) candidate is a connected convex
//! subgraph of a block's dataflow DAG with a bounded input count. The
//! [`enumerate::Enumerator`] finds every candidate and names it by its
//! canonical RPN key; the [`select::Selector`] tiles a block against a
//! library of such keys at minimal total cost; [`synth::synthesize_area`]
//! prices the silicon footprint of an instruction set.

pub mod enumerate;
pub mod parser;
pub mod select;
pub mod synth;

pub use enumerate::Enumerator;
pub use parser::{MisoInstr, parse_miso};
pub use select::Selector;
pub use synth::synthesize_area;
