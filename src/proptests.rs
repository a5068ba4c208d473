use super::{BpTree, Comparator, NaturalOrder};

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Walks the tree level by level and asserts every structural invariant.
pub(crate) fn validate_tree<K: fmt::Debug + Clone, C: Comparator<K>>(t: &BpTree<K, C>) {
    assert!(t.nodes[t.root].parent.is_none(), "root must not have a parent");

    let mut level = vec![t.root];
    let mut reachable = 0usize;
    let mut leaf_keys = 0usize;

    loop {
        reachable += level.len();

        let first = level[0];
        let last = level[level.len() - 1];
        assert!(t.nodes[first].left.is_none(), "level head has a left link");
        assert!(t.nodes[last].right.is_none(), "level tail has a right link");
        for pair in level.windows(2) {
            assert_eq!(t.nodes[pair[0]].right, Some(pair[1]), "broken right link");
            assert_eq!(t.nodes[pair[1]].left, Some(pair[0]), "broken left link");
        }

        let is_leaf = t.nodes[first].is_leaf();
        let mut next = Vec::new();
        for &id in &level {
            let node = &t.nodes[id];
            assert_eq!(node.is_leaf(), is_leaf, "leaves must all be at the same depth");
            assert!(node.size() < t.degree, "node {id} overflows: {}", node.size());
            if id != t.root {
                assert!(node.size() > 0, "non-root node {id} is empty");
            }
            for pair in node.keys.windows(2) {
                assert_eq!(
                    t.cmp.compare(&pair[0], &pair[1]),
                    Ordering::Less,
                    "keys of {id} not strictly ascending: {:?}",
                    node.keys
                );
            }

            if is_leaf {
                leaf_keys += node.size();
                continue;
            }

            let children = node.children();
            assert_eq!(children.len(), node.size() + 1, "child count of {id}");
            for (i, &child) in children.iter().enumerate() {
                assert_eq!(t.nodes[child].parent, Some(id), "parent link of {child}");
                if i == 0 {
                    continue;
                }
                let min = t.subtree_min(child).expect("non-root subtree is non-empty");
                assert_eq!(
                    t.cmp.compare(&node.keys[i - 1], min),
                    Ordering::Equal,
                    "guide {i} of {id} is {:?}, subtree min is {min:?}",
                    node.keys[i - 1]
                );
                let prev_max = t.nodes[t.rightmost_leaf(children[i - 1])]
                    .keys
                    .last()
                    .expect("non-root subtree is non-empty");
                assert_eq!(
                    t.cmp.compare(prev_max, min),
                    Ordering::Less,
                    "children {} and {i} of {id} overlap",
                    i - 1
                );
            }
            next.extend_from_slice(children);
        }

        if is_leaf {
            break;
        }
        level = next;
    }

    assert_eq!(leaf_keys, t.len, "leaf key count must match len");
    assert_eq!(reachable, t.nodes.live(), "arena holds unreachable nodes");

    let mut count = 0usize;
    let mut prev: Option<&K> = None;
    for key in t.iter() {
        if let Some(prev) = prev {
            assert_eq!(t.cmp.compare(prev, key), Ordering::Less, "iteration out of order");
        }
        prev = Some(key);
        count += 1;
    }
    assert_eq!(count, t.len, "iteration must visit every key once");
}

/// Key with a payload that does not take part in ordering.
#[derive(Clone, Debug)]
struct Item {
    key: u16,
    value: u64,
}

fn by_key(a: &Item, b: &Item) -> Ordering {
    a.key.cmp(&b.key)
}

fn probe(key: u16) -> Item {
    Item { key, value: 0 }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "0u16..400")] u16, u64),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "0u16..400")] u16),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "0u16..400")] u16),
    PopFirst,
    PopLast,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_btreemap(
        degree in 4usize..=10,
        ops in prop::collection::vec(any::<Op>(), 0..=1500),
    ) {
        let mut t = BpTree::with_degree(degree, by_key).unwrap();
        let mut m: BTreeMap<u16, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(Item { key, value }).map(|i| i.value);
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Remove(key) => {
                    let old_t = t.remove(&probe(key)).map(|i| i.value);
                    let old_m = m.remove(&key);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Get(key) => {
                    let got_t = t.get(&probe(key)).map(|i| i.value);
                    let got_m = m.get(&key).copied();
                    prop_assert_eq!(got_t, got_m);
                }
                Op::PopFirst => {
                    let got_t = t.pop_first().map(|i| (i.key, i.value));
                    prop_assert_eq!(got_t, m.pop_first());
                }
                Op::PopLast => {
                    let got_t = t.pop_last().map(|i| (i.key, i.value));
                    prop_assert_eq!(got_t, m.pop_last());
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        prop_assert_eq!(t.min_key().map(|i| i.key), m.keys().next().copied());
        prop_assert_eq!(t.max_key().map(|i| i.key), m.keys().next_back().copied());
        let got: Vec<(u16, u64)> = t.iter().map(|i| (i.key, i.value)).collect();
        let expected: Vec<(u16, u64)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_every_step_valid(
        degree in 4usize..=6,
        keys in prop::collection::vec(0u16..200, 0..=300),
    ) {
        let mut t = BpTree::with_degree(degree, NaturalOrder).unwrap();
        for &k in &keys {
            t.insert(k);
            validate_tree(&t);
        }
        for &k in keys.iter().rev() {
            t.remove(&k);
            validate_tree(&t);
        }
        prop_assert!(t.is_empty());
        prop_assert_eq!(t.height(), 1);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u32> = (1..=7).collect();

    for degree in [4, 5] {
        for_each_permutation(&keys, |perm| {
            let mut t = BpTree::with_degree(degree, NaturalOrder).unwrap();
            for k in perm {
                assert_eq!(t.insert(k), None);
                validate_tree(&t);
            }
            assert_eq!(t.iter().copied().collect::<Vec<_>>(), keys);
        });
    }
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u32> = (1..=7).collect();

    for degree in [4, 5] {
        let mut base = BpTree::with_degree(degree, NaturalOrder).unwrap();
        base.extend(keys.iter().copied());

        for_each_permutation(&keys, |perm| {
            let mut t = base.clone();
            let mut left: Vec<u32> = keys.clone();
            for k in perm {
                assert_eq!(t.remove(&k), Some(k));
                assert_eq!(t.remove(&k), None);
                left.retain(|&x| x != k);
                validate_tree(&t);
                assert_eq!(t.iter().copied().collect::<Vec<_>>(), left);
            }
            assert!(t.is_empty());
            assert_eq!(t.node_count(), 1);
        });
    }
}

/// Long mixed workload cross-checked against a hash map over a small key
/// space, so that inserts, replacements and removals all hit often.
#[test]
fn randomized_workload_matches_hash_map() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const OPS: usize = 200_000;
    const KEYS: u32 = 100;

    let mut rng = StdRng::seed_from_u64(3);
    let mut t = BpTree::with_degree(4, NaturalOrder).unwrap();
    let mut m: HashMap<u32, u32> = HashMap::new();

    let mut digest = 0u32;
    let mut inserted = 0usize;
    let mut deleted = 0usize;

    for _ in 0..OPS {
        let value = rng.gen_range(0..KEYS);
        match rng.gen_range(0..3) {
            0 => {
                assert_eq!(t.get(&value).copied(), m.get(&value).copied());
            }
            1 => {
                let prev = t.insert(value);
                assert_eq!(prev, m.insert(value, value));
                if prev.is_none() {
                    digest ^= value;
                    inserted += 1;
                }
            }
            _ => {
                let prev = t.remove(&value);
                assert_eq!(prev, m.remove(&value));
                if prev.is_some() {
                    digest ^= value;
                    deleted += 1;
                }
            }
        }
    }

    validate_tree(&t);
    assert_eq!(t.len(), m.len());
    assert_eq!(t.len(), t.iter().count());

    for value in 0..KEYS {
        let prev = t.remove(&value);
        assert_eq!(prev, m.remove(&value));
        if prev.is_some() {
            digest ^= value;
            deleted += 1;
        }
    }

    assert_eq!(digest, 0);
    assert_eq!(inserted, deleted);
    assert!(t.is_empty());
    let s = t.stats();
    assert!(s.split_leaf > 0 && s.split_internal > 0);
    assert!(s.merge_left_leaf + s.merge_right_leaf > 0);
    assert!(s.borrow_left_leaf + s.borrow_right_leaf > 0);
}

#[test]
fn randomized_batches_match_hash_map() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(4);
    let mut t = BpTree::with_degree(6, NaturalOrder).unwrap();
    let mut m: HashMap<u32, u32> = HashMap::new();

    for _ in 0..500 {
        let batch: Vec<u32> = (0..rng.gen_range(0..40))
            .map(|_| rng.gen_range(0..1000))
            .collect();
        match rng.gen_range(0..3) {
            0 => {
                let expected: Vec<u32> = batch.iter().filter_map(|k| m.get(k).copied()).collect();
                let got: Vec<u32> = t.lookup_batch(&batch).into_iter().copied().collect();
                assert_eq!(got, expected);
            }
            1 => {
                let expected: Vec<u32> = batch.iter().filter_map(|&k| m.insert(k, k)).collect();
                assert_eq!(t.insert_batch(batch), expected);
            }
            _ => {
                let expected: Vec<u32> = batch.iter().filter_map(|k| m.remove(k)).collect();
                assert_eq!(t.delete_batch(&batch), expected);
            }
        }
        assert_eq!(t.len(), m.len());
    }
    validate_tree(&t);
}
