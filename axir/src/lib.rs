//! Textual front-end: a small SSA block language lowered into dataflow
//! DAGs, plus the per-block weight configuration format.

pub mod conf;
pub mod lower;
pub mod module;
pub mod parser;

pub use lower::lower_module;
pub use module::{Block, Function, Instr, Module, Operand, Terminator};
pub use parser::{ParseReport, parse_module};
