use std::collections::BTreeSet;

use axdag::Permutations;

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

#[test]
fn yields_exactly_n_factorial_distinct_permutations() {
    for n in 0..=7 {
        let mut seen: BTreeSet<Vec<usize>> = BTreeSet::new();
        let mut count = 0usize;
        let mut perms = Permutations::new(n);
        while let Some(perm) = perms.next() {
            count += 1;
            // Each yield is a permutation of {0, .., n-1}.
            let mut sorted = perm.to_vec();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..n).collect::<Vec<_>>());
            seen.insert(perm.to_vec());
        }
        assert_eq!(count, factorial(n), "count for n = {}", n);
        assert_eq!(seen.len(), factorial(n), "distinct for n = {}", n);
    }
}

#[test]
fn zero_slots_yield_the_empty_arrangement_once() {
    let mut perms = Permutations::new(0);
    assert_eq!(perms.next(), Some(&[][..]));
    assert_eq!(perms.next(), None);
    assert_eq!(perms.next(), None);
}

#[test]
fn order_is_lexicographic() {
    let mut perms = Permutations::new(3);
    let mut all = Vec::new();
    while let Some(perm) = perms.next() {
        all.push(perm.to_vec());
    }
    assert_eq!(
        all,
        vec![
            vec![0, 1, 2],
            vec![0, 2, 1],
            vec![1, 0, 2],
            vec![1, 2, 0],
            vec![2, 0, 1],
            vec![2, 1, 0],
        ]
    );
}

#[test]
fn exhausted_generator_stays_exhausted() {
    let mut perms = Permutations::new(2);
    assert!(perms.next().is_some());
    assert!(perms.next().is_some());
    assert!(perms.next().is_none());
    assert!(perms.next().is_none());
}
