use axdag::{Dag, Op};

#[test]
fn plain_rpn_is_postfix() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let i2 = dag.add(Op::Input(2));
    let add = dag.add_with(Op::Add, [i1, i2]);

    assert_eq!(dag.rpn(add), "$1 $2 +");
}

#[test]
fn associative_arity_above_two_is_spelled_out() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let i2 = dag.add(Op::Input(2));
    let i3 = dag.add(Op::Input(3));
    let add = dag.add_with(Op::Add, [i1, i2, i3]);

    assert_eq!(dag.rpn(add), "$1 $2 $3 +3");
    assert_eq!(dag.ref_rpn(add), "$1 $2 $3 +3");
}

#[test]
fn constants_emit_their_spelling() {
    let mut dag = Dag::new();
    let five = dag.add(Op::Const("5".into()));
    let i1 = dag.add(Op::Input(1));
    let add = dag.add_with(Op::Add, [five, i1]);

    assert_eq!(dag.rpn(add), "5 $1 +");
}

#[test]
fn labels_are_transparent() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let i2 = dag.add(Op::Input(2));
    let shl = dag.add_with(Op::Shl, [i1, i2]);
    dag.relax_order(shl);

    assert_eq!(dag.rpn(shl), "$1 $2 <<");
    assert_eq!(dag.ref_rpn(shl), "$1 $2 <<");
}

#[test]
fn shared_subexpressions_become_references() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let i2 = dag.add(Op::Input(2));
    let shared = dag.add_with(Op::Add, [i1, i2]);
    let mul = dag.add_with(Op::Mul, [shared, shared]);

    // Plain form writes the shared node twice, the referenced form points
    // back at token 3.
    assert_eq!(dag.rpn(mul), "$1 $2 + $1 $2 + *");
    assert_eq!(dag.ref_rpn(mul), "$1 $2 + @3 *");
}

#[test]
fn shared_inputs_become_references() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let mul = dag.add_with(Op::Mul, [i1, i1]);

    assert_eq!(dag.ref_rpn(mul), "$1 @1 *");
}

#[test]
fn reference_numbering_counts_every_token() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let i2 = dag.add(Op::Input(2));
    let inner = dag.add_with(Op::And, [i1, i2]);
    let left = dag.add_with(Op::Xor, [inner, i1]);
    let root = dag.add_with(Op::Or, [left, inner]);

    // Tokens: $1(1) $2(2) &(3) @1(4) ^(5) @3(6) |(7)
    assert_eq!(dag.ref_rpn(root), "$1 $2 & @1 ^ @3 |");
}
