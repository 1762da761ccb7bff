//! Parser for the line-oriented instruction exchange format.
//!
//! One instruction per line, whitespace-separated postfix tokens: decimal
//! literals, `$k` inputs, operator spellings (associative operators may
//! carry an arity suffix of at least 3), and `@n` references reusing the
//! n-th token of the same line as a shared subexpression. Each line must
//! leave exactly one value on the operand stack.

use log::debug;
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use axdag::node::TokenError;
use axdag::{Dag, NodeId, Op};

/// A parsed instruction: the legalized DAG plus its single output node.
#[derive(Debug, Clone)]
pub struct MisoInstr {
    pub dag: Dag,
    pub root: NodeId,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}, token {token}: {source}")]
    Token {
        line: usize,
        token: usize,
        source: TokenError,
    },
    #[error("line {line}, token {token}: invalid reference `{text}`")]
    BadRef {
        line: usize,
        token: usize,
        text: String,
    },
    #[error("line {line}, token {token}: reference `@{index}` is out of bounds")]
    RefOutOfBounds {
        line: usize,
        token: usize,
        index: usize,
    },
    #[error("line {line}, token {token}: operand stack underflow")]
    StackUnderflow { line: usize, token: usize },
    #[error("line {line}: expected exactly one output, found {found}")]
    ExtraOutputs { line: usize, found: usize },
}

/// Parses every non-blank line of `text` as one instruction.
pub fn parse_miso(text: &str) -> Result<Vec<MisoInstr>, ParseError> {
    let mut instrs = Vec::new();

    for (line_idx, raw) in text.lines().enumerate() {
        let line = line_idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut dag = Dag::new();
        // rpn[i] is the node behind token i + 1, references included.
        let mut rpn: Vec<NodeId> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();

        for (tok_idx, token) in trimmed.split_ascii_whitespace().enumerate() {
            let tok = tok_idx + 1;

            if let Some(rest) = token.strip_prefix('@') {
                let index: usize = rest.parse().map_err(|_| ParseError::BadRef {
                    line,
                    token: tok,
                    text: token.to_string(),
                })?;
                if index < 1 || index > rpn.len() {
                    return Err(ParseError::RefOutOfBounds {
                        line,
                        token: tok,
                        index,
                    });
                }
                let node = rpn[index - 1];
                rpn.push(node);
                stack.push(node);
                continue;
            }

            let (op, arity) = Op::from_token(token).map_err(|source| ParseError::Token {
                line,
                token: tok,
                source,
            })?;
            let mut preds: SmallVec<[NodeId; 2]> = smallvec![NodeId(0); arity];
            for slot in (0..arity).rev() {
                let Some(operand) = stack.pop() else {
                    return Err(ParseError::StackUnderflow { line, token: tok });
                };
                preds[slot] = operand;
            }
            let id = dag.add_with(op, preds);
            rpn.push(id);
            stack.push(id);
        }

        if stack.len() != 1 {
            return Err(ParseError::ExtraOutputs {
                line,
                found: stack.len(),
            });
        }
        let root = stack[0];
        dag.legalize();
        instrs.push(MisoInstr { dag, root });
    }

    debug!("parsed {} instructions", instrs.len());
    Ok(instrs)
}
