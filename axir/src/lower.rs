//! Per-block lowering of the SSA input language into dataflow DAGs.
//!
//! Each basic block becomes one DAG. Values defined in another block (and
//! function parameters) materialize as `Unknown` virtual inputs; literals
//! become `Const` leaves shared per spelling within the block. A value
//! used outside its block, or referenced before its definition by an
//! earlier phi, receives an `Unknown` virtual sink so that enumeration
//! treats it as a block output. Terminator operands lower to sinks as
//! well. Phi instructions themselves lower to `Unknown` nodes.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use smallvec::SmallVec;

use axdag::{Dag, NodeId, Op};

use crate::module::{BinOp, Block, CmpOp, Function, Instr, Module, Operand};

fn bin_op(op: BinOp) -> Op {
    match op {
        BinOp::Add => Op::Add,
        BinOp::Sub => Op::Sub,
        BinOp::Mul => Op::Mul,
        BinOp::Div => Op::Div,
        BinOp::Rem => Op::Rem,
        BinOp::Shl => Op::Shl,
        BinOp::Lshr => Op::LShr,
        BinOp::Ashr => Op::AShr,
        BinOp::And => Op::And,
        BinOp::Or => Op::Or,
        BinOp::Xor => Op::Xor,
    }
}

fn cmp_op(op: CmpOp) -> Op {
    match op {
        CmpOp::Eq => Op::Eq,
        CmpOp::Ne => Op::Ne,
        CmpOp::Gt => Op::Gt,
        CmpOp::Ge => Op::Ge,
        CmpOp::Lt => Op::Lt,
        CmpOp::Le => Op::Le,
    }
}

/// Lowers every basic block of every function, in source order.
pub fn lower_module(module: &Module) -> Vec<Dag> {
    module.functions.iter().flat_map(lower_function).collect()
}

/// Lowers one function to one DAG per block.
pub fn lower_function(func: &Function) -> Vec<Dag> {
    // Which blocks consume each register, terminators included.
    let mut used_in: HashMap<&str, HashSet<usize>> = HashMap::new();
    for (b, block) in func.blocks.iter().enumerate() {
        for instr in &block.instrs {
            for operand in instr.operands() {
                if let Operand::Reg(name) = operand {
                    used_in.entry(name).or_default().insert(b);
                }
            }
        }
        if let Some(Operand::Reg(name)) = block.terminator.operand() {
            used_in.entry(name).or_default().insert(b);
        }
    }

    func.blocks
        .iter()
        .enumerate()
        .map(|(b, block)| lower_block(block, b, &used_in))
        .collect()
}

fn lower_block(block: &Block, block_idx: usize, used_in: &HashMap<&str, HashSet<usize>>) -> Dag {
    let mut dag = Dag::new();
    // Block-local value map; register keys keep their `%` so they never
    // collide with literal spellings.
    let mut values: HashMap<String, NodeId> = HashMap::new();

    for instr in &block.instrs {
        let (op, operands): (Op, SmallVec<[&Operand; 3]>) = match instr {
            Instr::Bin { op, .. } => (bin_op(*op), instr.operands()),
            Instr::Cmp { op, .. } => (cmp_op(*op), instr.operands()),
            Instr::Select { .. } => (Op::Select, instr.operands()),
            // A phi merges control flow; its value is opaque here.
            Instr::Phi { .. } => (Op::Unknown, instr.operands()),
        };
        let preds: SmallVec<[NodeId; 2]> = operands
            .into_iter()
            .map(|operand| resolve(&mut dag, &mut values, operand))
            .collect();

        let dest = reg_key(instr.dest());
        // An existing entry means an earlier phi referenced this name
        // before its definition; the placeholder stays as the phi operand
        // and the real value must surface as a block output.
        let forward_ref = values.contains_key(&dest);
        let id = dag.add_with(op, preds);
        values.insert(dest, id);

        let escapes = used_in
            .get(instr.dest())
            .is_some_and(|blocks| blocks.iter().any(|&user| user != block_idx));
        if forward_ref || escapes {
            dag.add_with(Op::Unknown, [id]);
        }
    }

    if let Some(operand) = block.terminator.operand() {
        let id = resolve(&mut dag, &mut values, operand);
        dag.add_with(Op::Unknown, [id]);
    }

    dag.propagate_succ();
    debug!("lowered block `{}`: {} nodes", block.label, dag.len());
    trace!("block `{}` dataflow:\n{}", block.label, dag.display());
    dag
}

fn reg_key(name: &str) -> String {
    format!("%{}", name)
}

fn resolve(dag: &mut Dag, values: &mut HashMap<String, NodeId>, operand: &Operand) -> NodeId {
    let key = match operand {
        Operand::Reg(name) => reg_key(name),
        Operand::Lit(text) => text.clone(),
    };
    if let Some(&id) = values.get(&key) {
        return id;
    }
    let id = match operand {
        Operand::Lit(text) => dag.add(Op::Const(text.as_str().into())),
        // Defined in another block, or a function parameter.
        Operand::Reg(_) => dag.add(Op::Unknown),
    };
    values.insert(key, id);
    id
}
