use axdag::{Dag, Op};

fn const_node(dag: &mut Dag, value: &str) -> axdag::NodeId {
    dag.add(Op::Const(value.into()))
}

#[test]
fn fresh_dags_are_empty() {
    let dag = Dag::new();
    assert!(dag.is_empty());
    assert_eq!(dag.len(), 0);
}

#[test]
fn sub_becomes_add_over_inverse() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "4");
    let b = const_node(&mut dag, "9");
    let sub = dag.add_with(Op::Sub, [a, b]);

    dag.to_associative(sub);

    assert_eq!(dag[sub].op, Op::Add);
    assert_eq!(dag[sub].preds[0], a);
    let wrapper = dag[sub].preds[1];
    assert_eq!(dag[wrapper].op, Op::AddInv);
    assert_eq!(dag[wrapper].preds[0], b);
}

#[test]
fn div_becomes_mul_over_inverse() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "8");
    let b = const_node(&mut dag, "2");
    let div = dag.add_with(Op::Div, [a, b]);

    dag.to_associative(div);

    assert_eq!(dag[div].op, Op::Mul);
    let wrapper = dag[div].preds[1];
    assert_eq!(dag[wrapper].op, Op::MulInv);
    assert_eq!(dag[wrapper].preds[0], b);
}

#[test]
fn associative_operands_flatten() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "1");
    let b = const_node(&mut dag, "2");
    let c = const_node(&mut dag, "3");
    let inner = dag.add_with(Op::Add, [a, b]);
    let outer = dag.add_with(Op::Add, [inner, c]);

    dag.relax_order(inner);
    dag.relax_order(outer);

    assert_eq!(dag[outer].preds.as_slice(), &[a, b, c]);
}

#[test]
fn normalize_flattens_nested_chains() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "1");
    let b = const_node(&mut dag, "2");
    let lvl1 = dag.add_with(Op::Add, [a, b]);
    let c = const_node(&mut dag, "3");
    let lvl2 = dag.add_with(Op::Add, [lvl1, c]);
    let d = const_node(&mut dag, "4");
    let lvl3 = dag.add_with(Op::Add, [lvl2, d]);

    dag.normalize();

    assert_eq!(dag[lvl3].preds.len(), 4);
    // No associative node keeps a same-typed operand.
    for id in dag.ids() {
        if dag[id].op.is_associative() {
            for &p in &dag[id].preds {
                assert_ne!(dag[p].op, dag[id].op);
            }
        }
    }
}

#[test]
fn ordered_operands_get_labels() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "7");
    let b = const_node(&mut dag, "3");
    let rem = dag.add_with(Op::Rem, [a, b]);

    dag.relax_order(rem);

    assert_eq!(dag[rem].preds[0], a);
    let label = dag[rem].preds[1];
    assert_eq!(dag[label].op, Op::Order1);
    assert_eq!(dag[label].preds[0], b);
}

#[test]
fn select_gets_both_labels() {
    let mut dag = Dag::new();
    let cond = const_node(&mut dag, "1");
    let on_true = const_node(&mut dag, "2");
    let on_false = const_node(&mut dag, "3");
    let select = dag.add_with(Op::Select, [cond, on_true, on_false]);

    dag.relax_order(select);

    assert_eq!(dag[select].preds[0], cond);
    assert_eq!(dag[dag[select].preds[1]].op, Op::Order1);
    assert_eq!(dag[dag[select].preds[2]].op, Op::Order2);
    assert_eq!(dag[dag[select].preds[1]].preds[0], on_true);
    assert_eq!(dag[dag[select].preds[2]].preds[0], on_false);
}

#[test]
fn commutative_comparisons_stay_unlabeled() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "5");
    let b = const_node(&mut dag, "6");
    let eq = dag.add_with(Op::Eq, [a, b]);

    dag.relax_order(eq);

    assert_eq!(dag[eq].preds.as_slice(), &[a, b]);
}

#[test]
fn propagate_succ_matches_pred_lists() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "1");
    let b = const_node(&mut dag, "2");
    let add = dag.add_with(Op::Add, [a, b]);
    let mul = dag.add_with(Op::Mul, [add, a]);

    dag.propagate_succ();

    for id in dag.ids() {
        for &p in &dag[id].preds {
            assert!(dag[p].succs.contains(&id));
        }
        for &s in &dag[id].succs {
            assert!(dag[s].preds.contains(&id));
        }
    }
    assert_eq!(dag[a].succs.len(), 2);
    assert_eq!(dag[add].succs.as_slice(), &[mul]);
    assert!(dag[mul].succs.is_empty());
}

#[test]
fn sort_orders_leaves_before_compound() {
    let mut dag = Dag::new();
    let c = const_node(&mut dag, "2");
    let input = dag.add(Op::Input(1));
    let mul = dag.add_with(Op::Mul, [c, input]);
    let add = dag.add_with(Op::Add, [mul, input, c]);

    dag.sort_preds(add);

    assert_eq!(dag[add].preds.as_slice(), &[c, input, mul]);
}

#[test]
fn sort_compares_constants_by_spelling() {
    let mut dag = Dag::new();
    let ten = const_node(&mut dag, "10");
    let nine = const_node(&mut dag, "9");
    let add = dag.add_with(Op::Add, [nine, ten]);

    dag.sort_preds(add);

    // Lexicographic on the literal text: "10" before "9".
    assert_eq!(dag[add].preds.as_slice(), &[ten, nine]);
}

#[test]
fn sort_breaks_ties_through_operands() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let i2 = dag.add(Op::Input(2));
    let i3 = dag.add(Op::Input(3));
    let small = dag.add_with(Op::Add, [i1, i2]);
    let large = dag.add_with(Op::Add, [i1, i3]);
    let xor = dag.add_with(Op::Xor, [large, small]);

    dag.sort_preds(xor);

    assert_eq!(dag[xor].preds.as_slice(), &[small, large]);
}

#[test]
fn sort_prefers_shorter_operand_lists() {
    let mut dag = Dag::new();
    let i1 = dag.add(Op::Input(1));
    let i2 = dag.add(Op::Input(2));
    let i3 = dag.add(Op::Input(3));
    let wide = dag.add_with(Op::Add, [i1, i2, i3]);
    let narrow = dag.add_with(Op::Add, [i1, i2]);
    let xor = dag.add_with(Op::Xor, [wide, narrow]);

    dag.sort_preds(xor);

    assert_eq!(dag[xor].preds.as_slice(), &[narrow, wide]);
}

#[test]
fn labels_sort_after_everything() {
    let mut dag = Dag::new();
    let a = const_node(&mut dag, "1");
    let b = const_node(&mut dag, "2");
    let shl = dag.add_with(Op::Shl, [a, b]);
    dag.relax_order(shl);

    dag.sort_preds(shl);

    assert_eq!(dag[shl].preds[0], a);
    assert!(dag[dag[shl].preds[1]].op.is_label());
}
