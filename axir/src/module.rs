//! AST for the block-structured SSA input language.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{EnumIter, IntoEnumIterator};

/// Register or decimal literal operand. Literals keep their spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operand {
    Reg(String),
    Lit(String),
}

/// Two-operand arithmetic and bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Lshr,
    Ashr,
    And,
    Or,
    Xor,
}

impl BinOp {
    pub fn to_str(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Rem => "rem",
            BinOp::Shl => "shl",
            BinOp::Lshr => "lshr",
            BinOp::Ashr => "ashr",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        BinOp::iter().find(|op| op.to_str() == s)
    }
}

/// Signed comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    pub fn to_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Gt => "gt",
            CmpOp::Ge => "ge",
            CmpOp::Lt => "lt",
            CmpOp::Le => "le",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        CmpOp::iter().find(|op| op.to_str() == s)
    }
}

/// One SSA instruction. Every instruction defines a value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Instr {
    Bin {
        dest: String,
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
    },
    Cmp {
        dest: String,
        op: CmpOp,
        lhs: Operand,
        rhs: Operand,
    },
    Select {
        dest: String,
        cond: Operand,
        on_true: Operand,
        on_false: Operand,
    },
    Phi {
        dest: String,
        incoming: Vec<(String, Operand)>,
    },
}

impl Instr {
    pub fn dest(&self) -> &str {
        match self {
            Instr::Bin { dest, .. }
            | Instr::Cmp { dest, .. }
            | Instr::Select { dest, .. }
            | Instr::Phi { dest, .. } => dest,
        }
    }

    pub fn operands(&self) -> SmallVec<[&Operand; 3]> {
        match self {
            Instr::Bin { lhs, rhs, .. } | Instr::Cmp { lhs, rhs, .. } => {
                SmallVec::from_slice(&[lhs, rhs])
            }
            Instr::Select {
                cond,
                on_true,
                on_false,
                ..
            } => SmallVec::from_slice(&[cond, on_true, on_false]),
            Instr::Phi { incoming, .. } => incoming.iter().map(|(_, operand)| operand).collect(),
        }
    }
}

/// Block terminator. Terminators end a block; their value operands are
/// consumed but define nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Terminator {
    Br { target: String },
    Cbr { cond: Operand, on_true: String, on_false: String },
    Ret { value: Option<Operand> },
}

impl Terminator {
    pub fn operand(&self) -> Option<&Operand> {
        match self {
            Terminator::Br { .. } => None,
            Terminator::Cbr { cond, .. } => Some(cond),
            Terminator::Ret { value } => value.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    pub label: String,
    pub instrs: Vec<Instr>,
    pub terminator: Terminator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn block_count(&self) -> usize {
        self.functions.iter().map(|f| f.blocks.len()).sum()
    }
}
