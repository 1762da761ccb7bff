//! Node model: the operation tag, the arena id, and the tile record.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{EnumDiscriminants, EnumIs};
use thiserror::Error;

/// Index of a node inside its owning [`Dag`](crate::dag::Dag).
///
/// Ids are dense, and for freshly built graphs the allocation order is a
/// topological order: a node's operands always have smaller ids than the
/// node itself. Structural rewrites append auxiliary nodes past the original
/// range; those are reached through operand edges only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Operation tag of a node.
///
/// `Const` keeps the literal decimal spelling, `Input(k)` is the k-th input
/// slot of an instruction (k >= 1), and `Order1`/`Order2` are the
/// single-operand labels that pin down operand positions of non-commutative
/// operations once their operand lists have been sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumDiscriminants, EnumIs)]
#[strum_discriminants(name(OpKind), derive(EnumIs, Hash))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", strum_discriminants(derive(Serialize, Deserialize)))]
pub enum Op {
    Unknown,
    Const(Box<str>),

    // Unary inverses introduced by the associative rewrite
    AddInv,
    MulInv,

    // Binary arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Binary bitwise
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,

    // Comparisons
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,

    // Ternary
    Select,

    // Ordering labels
    // Note: operand position 0 never needs a label.
    Order1,
    Order2,

    Input(u32),
}

/// Error parsing a single RPN token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("input index must be at least 1 in `{0}`")]
    BadInputIndex(String),
    #[error("arity suffix must be at least 3 in `{0}`")]
    BadAritySuffix(String),
}

impl Op {
    pub fn kind(&self) -> OpKind {
        self.into()
    }

    /// Operations whose operand list may be flattened and freely reordered.
    pub fn is_associative(&self) -> bool {
        matches!(self, Op::Add | Op::Mul | Op::And | Op::Or | Op::Xor)
    }

    /// Operations whose operand positions carry meaning. Their operands at
    /// position 1 and 2 receive order labels. `Eq`/`Ne` are commutative and
    /// stay unlabeled.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            Op::Sub
                | Op::Div
                | Op::Rem
                | Op::Shl
                | Op::LShr
                | Op::AShr
                | Op::Gt
                | Op::Ge
                | Op::Lt
                | Op::Le
                | Op::Select
        )
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Op::Order1 | Op::Order2)
    }

    /// Fixed spelling of the tag. Constants and inputs spell themselves;
    /// the names here are what the RPN writers emit for everything else.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Unknown => "unk",
            Op::Const(_) => "C",
            Op::AddInv => "*-1",
            Op::MulInv => "^-1",
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Rem => "%",
            Op::Shl => "<<",
            Op::LShr => ">>>",
            Op::AShr => ">>",
            Op::And => "&",
            Op::Or => "|",
            Op::Xor => "^",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Select => "?:",
            Op::Order1 => "[1]",
            Op::Order2 => "[2]",
            Op::Input(_) => "$",
        }
    }

    /// Parses one RPN token into an operation and its operand count.
    ///
    /// Accepts decimal literals (optional leading `-`), `$k` inputs,
    /// operator spellings, and associative operators with an arity suffix
    /// of at least 3 (`+3`). `@n` references are not operations and are
    /// handled by the caller.
    pub fn from_token(token: &str) -> Result<(Op, usize), TokenError> {
        let digits = token.strip_prefix('-').unwrap_or(token);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok((Op::Const(token.into()), 0));
        }

        if let Some(rest) = token.strip_prefix('$') {
            return match rest.parse::<u32>() {
                Ok(k) if k >= 1 => Ok((Op::Input(k), 0)),
                _ => Err(TokenError::BadInputIndex(token.to_string())),
            };
        }

        let exact = match token {
            "*-1" => Some((Op::AddInv, 1)),
            "^-1" => Some((Op::MulInv, 1)),
            "+" => Some((Op::Add, 2)),
            "-" => Some((Op::Sub, 2)),
            "*" => Some((Op::Mul, 2)),
            "/" => Some((Op::Div, 2)),
            "%" => Some((Op::Rem, 2)),
            "<<" => Some((Op::Shl, 2)),
            ">>>" => Some((Op::LShr, 2)),
            ">>" => Some((Op::AShr, 2)),
            "&" => Some((Op::And, 2)),
            "|" => Some((Op::Or, 2)),
            "^" => Some((Op::Xor, 2)),
            "==" => Some((Op::Eq, 2)),
            "!=" => Some((Op::Ne, 2)),
            ">" => Some((Op::Gt, 2)),
            ">=" => Some((Op::Ge, 2)),
            "<" => Some((Op::Lt, 2)),
            "<=" => Some((Op::Le, 2)),
            "?:" => Some((Op::Select, 3)),
            _ => None,
        };
        if let Some(hit) = exact {
            return Ok(hit);
        }

        // Associative operator with an explicit arity, e.g. `+3`.
        for (spelling, op) in [
            ("+", Op::Add),
            ("*", Op::Mul),
            ("&", Op::And),
            ("|", Op::Or),
            ("^", Op::Xor),
        ] {
            if let Some(rest) = token.strip_prefix(spelling) {
                if let Ok(arity) = rest.parse::<usize>() {
                    if arity < 3 {
                        return Err(TokenError::BadAritySuffix(token.to_string()));
                    }
                    return Ok((op, arity));
                }
            }
        }

        Err(TokenError::UnknownOperator(token.to_string()))
    }

    /// Total ordering rank used by the structural comparison: leaves sort
    /// before compound operations, order labels after everything.
    pub(crate) fn rank(&self) -> (u8, u64) {
        match self {
            Op::Unknown => (0, 0),
            Op::Const(_) => (0, 1),
            Op::Input(k) => (0, 1 + u64::from(*k)),
            Op::Order1 => (2, 0),
            Op::Order2 => (2, 1),
            other => (1, OpKind::from(other) as u64),
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Const(value) => f.write_str(value),
            Op::Input(k) => write!(f, "${}", k),
            other => f.write_str(other.name()),
        }
    }
}

impl Default for Op {
    fn default() -> Self {
        Op::Unknown
    }
}

/// A matched instruction tile rooted at some host node.
///
/// `operands` holds the host nodes feeding the tile, ordered by input slot
/// (`operands[k]` feeds `$k+1`); `covered` lists the host nodes the tile
/// replaces, inputs excluded. An empty `rpn` marks the default
/// one-operation tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub rpn: String,
    pub cost: u64,
    pub operands: SmallVec<[NodeId; 2]>,
    pub covered: SmallVec<[NodeId; 4]>,
}

impl Tile {
    pub fn is_default(&self) -> bool {
        self.rpn.is_empty()
    }
}

/// A single DAG node: operation tag, ordered operands, derived successors
/// and the tiles matched at this node.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub op: Op,
    pub preds: SmallVec<[NodeId; 2]>,
    pub succs: SmallVec<[NodeId; 4]>,
    pub tiles: Vec<Tile>,
}

impl Node {
    pub fn new(op: Op) -> Self {
        Node {
            op,
            preds: SmallVec::new(),
            succs: SmallVec::new(),
            tiles: Vec::new(),
        }
    }
}
