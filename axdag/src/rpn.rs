//! Postfix writers.
//!
//! Both writers emit space-separated postfix tokens: operands first, then
//! the operator, with an arity suffix on associative operators that carry
//! more than two operands. Order labels are transparent. The referenced
//! writer additionally numbers every emitted token and re-emits a shared
//! node as `@n`, where `n` is the token position of its first emission.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::dag::Dag;
use crate::node::{NodeId, Op};

impl Dag {
    /// Plain postfix form of the subgraph under `root`. Shared nodes are
    /// written out in full at every use.
    pub fn write_rpn(&self, root: NodeId, buf: &mut String) {
        match &self[root].op {
            Op::Const(value) => buf.push_str(value),
            Op::Order1 | Op::Order2 => self.write_rpn(self[root].preds[0], buf),
            Op::Input(k) => {
                let _ = write!(buf, "${}", k);
            }
            op => {
                for &p in &self[root].preds {
                    self.write_rpn(p, buf);
                    buf.push(' ');
                }
                buf.push_str(op.name());
                if op.is_associative() && self[root].preds.len() > 2 {
                    let _ = write!(buf, "{}", self[root].preds.len());
                }
            }
        }
    }

    pub fn rpn(&self, root: NodeId) -> String {
        let mut buf = String::new();
        self.write_rpn(root, &mut buf);
        buf
    }

    /// Referenced postfix form, the canonical shared-subexpression
    /// spelling. Token numbering is per call; no node state is touched.
    pub fn write_ref_rpn(&self, root: NodeId, buf: &mut String) {
        let mut ids: HashMap<NodeId, usize> = HashMap::new();
        let mut next = 1usize;
        self.write_ref_rpn_rec(root, buf, &mut ids, &mut next);
    }

    pub fn ref_rpn(&self, root: NodeId) -> String {
        let mut buf = String::new();
        self.write_ref_rpn(root, &mut buf);
        buf
    }

    fn write_ref_rpn_rec(
        &self,
        id: NodeId,
        buf: &mut String,
        ids: &mut HashMap<NodeId, usize>,
        next: &mut usize,
    ) {
        if let Some(&seen) = ids.get(&id) {
            let _ = write!(buf, "@{}", seen);
            *next += 1;
            return;
        }
        match &self[id].op {
            Op::Const(value) => {
                buf.push_str(value);
                ids.insert(id, *next);
                *next += 1;
            }
            // Labels take up no token slot.
            Op::Order1 | Op::Order2 => self.write_ref_rpn_rec(self[id].preds[0], buf, ids, next),
            Op::Input(k) => {
                let _ = write!(buf, "${}", k);
                ids.insert(id, *next);
                *next += 1;
            }
            op => {
                for &p in &self[id].preds {
                    self.write_ref_rpn_rec(p, buf, ids, next);
                    buf.push(' ');
                }
                buf.push_str(op.name());
                if op.is_associative() && self[id].preds.len() > 2 {
                    let _ = write!(buf, "{}", self[id].preds.len());
                }
                ids.insert(id, *next);
                *next += 1;
            }
        }
    }
}
