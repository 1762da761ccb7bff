use axdag::Op;
use axir::conf::{ConfError, parse_conf};
use axir::lower::{lower_function, lower_module};
use axir::module::{BinOp, CmpOp, Instr, Operand, Terminator};
use axir::parser::parse_module;

const KERNEL: &str = r#"
define %kernel(%a, %b) {
entry:
    %t0 = mul %a, %b
    %t1 = add %t0, 7
    %flag = cmp gt %t1, 0
    cbr %flag, hot, cold
hot:
    %t2 = sub %t1, %a
    br cold
cold:
    %t3 = phi [hot, %t2], [entry, %t1]
    ret %t3
}
"#;

#[test]
fn functions_blocks_and_instructions_parse() {
    let module = parse_module(KERNEL).expect("kernel parses");
    assert_eq!(module.functions.len(), 1);

    let func = &module.functions[0];
    assert_eq!(func.name, "kernel");
    assert_eq!(func.params, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(func.blocks.len(), 3);
    assert_eq!(module.block_count(), 3);

    let entry = &func.blocks[0];
    assert_eq!(entry.label, "entry");
    assert_eq!(entry.instrs.len(), 3);
    assert!(matches!(entry.terminator, Terminator::Cbr { .. }));

    match &func.blocks[2].instrs[0] {
        Instr::Phi { dest, incoming } => {
            assert_eq!(dest, "t3");
            assert_eq!(incoming.len(), 2);
            assert_eq!(incoming[0].0, "hot");
            assert_eq!(incoming[0].1, Operand::Reg("t2".to_string()));
        }
        other => panic!("expected phi, got {:?}", other),
    }
}

#[test]
fn parse_errors_carry_spans() {
    let reports = parse_module("define kernel() { }").unwrap_err();
    assert!(!reports.is_empty());
    assert!(!reports[0].message.is_empty());
    assert!(reports[0].span.start <= reports[0].span.end);
}

#[test]
fn each_block_lowers_to_one_dag() {
    let module = parse_module(KERNEL).expect("kernel parses");
    let dags = lower_module(&module);
    assert_eq!(dags.len(), 3);
}

#[test]
fn out_of_block_values_become_virtual_inputs_and_sinks() {
    let module = parse_module(KERNEL).expect("kernel parses");
    let dags = lower_module(&module);

    // entry: two parameter inputs, mul, the literal 7, add plus its
    // escape sink, the literal 0, the compare, and the terminator sink.
    let entry = &dags[0];
    assert_eq!(entry.len(), 9);
    let unknowns = entry.iter().filter(|n| n.op.is_unknown()).count();
    assert_eq!(unknowns, 4);
    let add = entry
        .ids()
        .find(|&id| entry[id].op == Op::Add)
        .expect("add lowers");
    // %t1 escapes into `cold`, so the add feeds a virtual sink.
    assert!(entry[add].succs.iter().any(|&s| entry[s].op.is_unknown()));

    // hot: %t1 and %a come from other blocks, %t2 escapes.
    let hot = &dags[1];
    assert_eq!(hot.len(), 4);
    let sub = hot
        .ids()
        .find(|&id| hot[id].op == Op::Sub)
        .expect("sub lowers");
    assert!(hot[sub].preds.iter().all(|&p| hot[p].op.is_unknown()));
}

#[test]
fn phi_lowers_to_an_opaque_merge() {
    let module = parse_module(KERNEL).expect("kernel parses");
    let dags = lower_module(&module);

    let cold = &dags[2];
    // phi node: Unknown with one operand per incoming edge.
    let phi = cold
        .ids()
        .find(|&id| cold[id].op.is_unknown() && cold[id].preds.len() == 2)
        .expect("phi lowers to a two-operand unknown");
    assert!(cold[phi].preds.iter().all(|&p| cold[p].op.is_unknown()));
}

#[test]
fn phi_back_references_sink_the_later_definition() {
    let source = r#"
define %loop() {
body:
    %x = phi [body, %y]
    %y = add %x, 1
    ret %y
}
"#;
    let module = parse_module(source).expect("loop parses");
    let func = &module.functions[0];
    let dags = lower_function(func);
    let dag = &dags[0];

    let add = dag
        .ids()
        .find(|&id| dag[id].op == Op::Add)
        .expect("add lowers");
    // One sink for the phi back-reference, one for the terminator.
    let sinks = dag[add]
        .succs
        .iter()
        .filter(|&&s| dag[s].op.is_unknown())
        .count();
    assert_eq!(sinks, 2);

    // The phi keeps its placeholder operand; it is not rewired to the
    // later definition.
    let phi = dag
        .ids()
        .find(|&id| dag[id].op.is_unknown() && dag[id].preds.len() == 1 && !dag[id].succs.is_empty())
        .expect("phi node");
    assert_ne!(dag[phi].preds[0], add);
}

#[test]
fn literals_are_shared_per_spelling_within_a_block() {
    let source = r#"
define %twice() {
entry:
    %u = add %a, 7
    %v = mul %u, 7
    ret %v
}
"#;
    let module = parse_module(source).expect("twice parses");
    let dags = lower_module(&module);
    let consts = dags[0]
        .iter()
        .filter(|n| matches!(n.op, Op::Const(_)))
        .count();
    assert_eq!(consts, 1);
}

#[test]
fn operation_spellings_round_trip() {
    use strum::IntoEnumIterator;
    for op in BinOp::iter() {
        assert_eq!(BinOp::from_str(op.to_str()), Some(op));
    }
    for op in CmpOp::iter() {
        assert_eq!(CmpOp::from_str(op.to_str()), Some(op));
    }
}

#[test]
fn conf_entries_parse_in_order() {
    let entries = parse_conf("entry = 3\n\n  hot =  12\ncold=1\n").expect("conf parses");
    assert_eq!(
        entries,
        vec![
            ("entry".to_string(), 3),
            ("hot".to_string(), 12),
            ("cold".to_string(), 1),
        ]
    );
}

#[test]
fn conf_rejects_incomplete_lines() {
    assert_eq!(
        parse_conf("entry 3").unwrap_err(),
        ConfError::MissingEquals { line: 1 }
    );
}

#[test]
fn conf_rejects_non_numeric_weights() {
    assert_eq!(
        parse_conf("entry = 3\nhot = fast").unwrap_err(),
        ConfError::BadWeight {
            line: 2,
            text: "fast".to_string(),
        }
    );
}
