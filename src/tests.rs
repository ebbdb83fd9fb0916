use std::{ops::Range, prelude::v1::*, rc::Rc};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn tree_of(keys: &[u32]) -> AvlTree<TestNode> {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    tree
}

fn node(tree: &AvlTree<TestNode>, key: u32) -> NonNull<TestNode> {
    tree.get_raw(&key).expect("item not found")
}

// Returns `(key, balance)` for every node in pre-order.
fn preorder(tree: &AvlTree<TestNode>) -> Vec<(u32, i8)> {
    fn walk(tree: &AvlTree<TestNode>, opt_node: Link<TestNode>, out: &mut Vec<(u32, i8)>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe {
            let links = tree.links(node);
            out.push((node.as_ref().key, links.balance()));
            walk(tree, links.left(), out);
            walk(tree, links.right(), out);
        }
    }

    let mut out = Vec::new();
    walk(tree, tree.root, &mut out);
    out
}

// Checks parent links only, for trees whose ordering was deliberately broken.
fn assert_linked(tree: &AvlTree<TestNode>) {
    fn walk(tree: &AvlTree<TestNode>, node: NonNull<TestNode>) {
        unsafe {
            for child in tree.links(node).children().into_iter().flatten() {
                assert_eq!(tree.links(child).parent(), Some(node));
                walk(tree, child);
            }
        }
    }

    if let Some(root) = tree.root {
        assert_eq!(unsafe { tree.links(root).parent() }, None);
        walk(tree, root);
    }
}

fn permutations(n: u32) -> Vec<Vec<u32>> {
    fn permute(prefix: &mut Vec<u32>, rest: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if rest.is_empty() {
            out.push(prefix.clone());
            return;
        }

        for i in 0..rest.len() {
            let key = rest.remove(i);
            prefix.push(key);
            permute(prefix, rest, out);
            prefix.pop();
            rest.insert(i, key);
        }
    }

    let mut out = Vec::new();
    permute(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }

    assert_eq!(tree.len(), keys.len());
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    for keys in permutations(4) {
        insert_find_all(&keys);
    }
}

#[test]
fn find_missing() {
    let tree = tree_of(&[4, 2, 6]);

    assert!(tree.get(&3).is_none());
    assert!(!tree.contains_key(&7));
    assert!(tree.contains_key(&6));
    assert!(AvlTree::<TestNode>::new().get(&0).is_none());
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        let removed = tree.remove(key).expect("item not found");
        assert_eq!(removed.key, *key);
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        let node = tree.get_raw(key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();
    }

    assert!(tree.root.is_none());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    for keys in permutations(4) {
        insert_remove_all(&keys);
    }
}

#[test]
fn remove_every_key_of_every_six_key_tree() {
    for keys in permutations(6) {
        for removed in 0..6 {
            let mut tree = tree_of(&keys);
            assert_eq!(tree.remove(&removed).map(|node| node.key), Some(removed));
            tree.assert_invariants();
            assert_eq!(tree.len(), 5);
        }
    }
}

#[test]
fn remove_in_reverse_from_every_seven_key_tree() {
    for keys in permutations(7) {
        let mut tree = tree_of(&keys);
        for (removed, &key) in keys.iter().rev().enumerate() {
            assert_eq!(tree.remove(&key).map(|node| node.key), Some(key));
            tree.assert_invariants();
            assert_eq!(tree.len(), keys.len() - removed - 1);
        }
        assert!(tree.is_empty());
    }
}

#[test]
fn remove_missing_is_noop() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5]);
    let before = preorder(&tree);

    assert!(tree.remove(&0).is_none());
    assert!(tree.remove(&6).is_none());

    assert_eq!(preorder(&tree), before);
    assert_eq!(tree.len(), 5);
}

#[test]
fn ascending_inserts_build_perfect_tree() {
    let tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(
        preorder(&tree),
        [(4, 0), (2, 0), (1, 0), (3, 0), (6, 0), (5, 0), (7, 0)]
    );
    assert_eq!(tree.height(), 3);
    assert!(tree.equal_paths());
}

#[test]
fn zig_zag_at_root() {
    let tree = tree_of(&[3, 1, 2]);

    assert_eq!(preorder(&tree), [(2, 0), (1, 0), (3, 0)]);
}

#[test]
fn zig_zag_mirrored() {
    let tree = tree_of(&[1, 3, 2]);

    assert_eq!(preorder(&tree), [(2, 0), (1, 0), (3, 0)]);
}

#[test]
fn removing_root_swaps_in_predecessor() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    let removed = tree.remove(&4).expect("item not found");
    assert_eq!(removed.key, 4);
    tree.assert_invariants();

    assert_eq!(
        preorder(&tree),
        [(3, 0), (2, -1), (1, 0), (6, 0), (5, 0), (7, 0)]
    );
}

#[test]
fn removal_propagates_through_four_levels() {
    let mut tree = tree_of(&[
        2, 20, 3, 17, 13, 8, 18, 14, 16, 15, 7, 10, 11, 12, 6, 19, 5, 1, 9, 4,
    ]);

    assert_eq!(
        preorder(&tree),
        [
            (13, -1),
            (8, -1),
            (3, 1),
            (2, -1),
            (1, 0),
            (6, -1),
            (5, -1),
            (4, 0),
            (7, 0),
            (11, -1),
            (10, -1),
            (9, 0),
            (12, 0),
            (16, 1),
            (14, 1),
            (15, 0),
            (18, 1),
            (17, 0),
            (20, -1),
            (19, 0),
        ]
    );

    // Removing 1 levels 2, double-rotates at 3, levels 8 and then the root.
    tree.remove(&1).expect("item not found");
    tree.assert_invariants();

    assert_eq!(
        preorder(&tree),
        [
            (13, 0),
            (8, 0),
            (5, 0),
            (3, 0),
            (2, 0),
            (4, 0),
            (6, 1),
            (7, 0),
            (11, -1),
            (10, -1),
            (9, 0),
            (12, 0),
            (16, 1),
            (14, 1),
            (15, 0),
            (18, 1),
            (17, 0),
            (20, -1),
            (19, 0),
        ]
    );
}

#[test]
fn duplicate_insert_replaces_in_place() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5]);
    let before = preorder(&tree);
    let old = node(&tree, 2);

    let replaced = tree
        .insert(TestNode::new(2))
        .expect("duplicate key must hand back the old item");
    assert_eq!(replaced.key, 2);
    assert_eq!(NonNull::from(&*replaced), old);
    assert_ne!(node(&tree, 2), old);

    tree.assert_invariants();
    assert_eq!(preorder(&tree), before);
    assert_eq!(tree.len(), 5);
}

#[test]
fn try_insert_rejects_duplicates() {
    let mut tree = tree_of(&[1, 2, 3]);
    let old = node(&tree, 3);

    let err = tree
        .try_insert(TestNode::new(3))
        .err()
        .expect("duplicate key must be rejected");
    assert_eq!(err.item().key, 3);
    assert_eq!(node(&tree, 3), old);
    assert_eq!(tree.len(), 3);

    let inserted = tree.try_insert(TestNode::new(4)).expect("key is absent");
    assert_eq!(inserted.key, 4);
    tree.assert_invariants();
    assert_eq!(tree.len(), 4);
}

#[test]
fn insert_all_remove_all_round_trip() {
    // 37 is invertible mod 101, so this visits every key in 1..=100 exactly once, out of order.
    let keys: Vec<u32> = (1..=100).map(|i| (i * 37) % 101).collect();
    let mut tree = tree_of(&keys);
    assert_eq!(tree.len(), 100);

    for key in keys.iter().rev().step_by(2).chain(keys.iter().step_by(2)) {
        assert!(tree.remove(key).is_some());
        tree.assert_invariants();
    }

    assert!(tree.root.is_none());
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
}

#[test]
fn height_stays_logarithmic() {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for key in 0..1000 {
        tree.insert(TestNode::new(key));
        assert!(tree.height() as f64 <= model::max_height(tree.len()));
    }

    tree.assert_invariants();

    for key in (0..1000).step_by(3) {
        tree.remove(&key);
        assert!(tree.height() as f64 <= model::max_height(tree.len()));
    }

    tree.assert_invariants();
}

#[test]
fn first_last_and_pops() {
    let mut tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);

    assert_eq!(tree.first().map(|n| n.key), Some(1));
    assert_eq!(tree.last().map(|n| n.key), Some(9));

    let mut popped = Vec::new();
    while let Some(first) = tree.pop_first() {
        tree.assert_invariants();
        popped.push(first.key);

        if let Some(last) = tree.pop_last() {
            tree.assert_invariants();
            popped.push(last.key);
        }
    }

    assert_eq!(popped, [1, 9, 3, 8, 4, 7, 5]);
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
}

#[test]
fn rotation_without_pivot_is_noop() {
    let mut tree = tree_of(&[1, 2]);
    let one = node(&tree, 1);
    let two = node(&tree, 2);

    // The root has no left child to lift.
    unsafe { tree.rotate(one, Dir::Right) };
    assert_eq!(preorder(&tree), [(1, 1), (2, 0)]);

    // Balance factors are left alone.
    unsafe { tree.rotate(one, Dir::Left) };
    assert_eq!(preorder(&tree), [(2, 0), (1, 1)]);
    assert_eq!(tree.root, Some(two));
    assert_linked(&tree);
}

#[test]
fn swap_distant_nodes() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);
    let four = node(&tree, 4);
    let three = node(&tree, 3);

    unsafe { tree.swap_nodes(four, three) };

    assert_eq!(tree.root, Some(three));
    assert_eq!(
        preorder(&tree),
        [(3, 0), (2, 0), (1, 0), (4, 0), (6, 0), (5, 0), (7, 0)]
    );
    assert_linked(&tree);
}

#[test]
fn swap_adjacent_nodes() {
    let mut tree = tree_of(&[2, 1]);
    let two = node(&tree, 2);
    let one = node(&tree, 1);

    unsafe { tree.swap_nodes(two, one) };

    assert_eq!(tree.root, Some(one));
    assert_eq!(preorder(&tree), [(1, -1), (2, 0)]);
    assert_linked(&tree);

    // Swapping back restores the tree.
    unsafe { tree.swap_nodes(one, two) };
    assert_eq!(preorder(&tree), [(2, -1), (1, 0)]);
    tree.assert_invariants();
}

#[test]
fn swap_sibling_nodes() {
    let mut tree = tree_of(&[2, 1, 3]);
    let one = node(&tree, 1);
    let three = node(&tree, 3);

    unsafe { tree.swap_nodes(one, three) };

    assert_eq!(preorder(&tree), [(2, 0), (3, 0), (1, 0)]);
    assert_linked(&tree);
}

#[test]
fn equal_paths() {
    assert!(tree_of(&[]).equal_paths());
    assert!(tree_of(&[1]).equal_paths());
    assert!(tree_of(&[1, 2]).equal_paths());
    assert!(tree_of(&[2, 1, 3]).equal_paths());
    assert!(!tree_of(&[2, 1, 3, 4]).equal_paths());
    assert!(tree_of(&[1, 2, 3, 4, 5, 6, 7]).equal_paths());
}

#[test]
fn clear_releases_everything() {
    let mut tree = tree_of(&[5, 3, 8, 1, 4, 7, 9, 2, 6]);

    tree.clear();
    assert!(tree.is_empty());
    tree.assert_invariants();

    tree.insert(TestNode::new(1));
    tree.assert_invariants();
    assert_eq!(tree.len(), 1);
}

#[test]
fn dotgraph() {
    let mut out = String::new();
    tree_of(&[]).dotgraph("empty", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-empty\" {}");

    let mut out = String::new();
    tree_of(&[2, 1, 3]).dotgraph("t", &mut out).unwrap();
    assert!(out.starts_with("digraph \"graph-t\" {\n subgraph \"subgraph-t\" {"));
    assert!(out.contains("{rank=same; \"grapht-2\" [label=\"2:0\"]; }\n"));
    assert!(out.contains("\"grapht-2\" -> \"grapht-1\";\n\"grapht-2\" -> \"grapht-3\";\n"));
    assert!(out.contains("\"grapht-3\" -> \"grapht-missing3\";\n"));
    assert!(out.ends_with(" }\n}"));
}

#[test]
fn map_insert_get_remove() {
    let mut map = AvlMap::new();

    assert_eq!(map.insert(2, "two"), None);
    assert_eq!(map.insert(1, "one"), None);
    assert_eq!(map.insert(3, "three"), None);
    assert_eq!(map.len(), 3);

    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(map.get(&4), None);

    // Overwriting keeps the element count.
    assert_eq!(map.insert(2, "deux"), Some("two"));
    assert_eq!(map.get(&2), Some(&"deux"));
    assert_eq!(map.len(), 3);

    if let Some(value) = map.get_mut(&3) {
        *value = "trois";
    }
    assert_eq!(map.get(&3), Some(&"trois"));

    assert_eq!(map.remove(&1), Some("one"));
    assert_eq!(map.remove(&1), None);
    map.assert_invariants();

    assert_eq!(map.first_key_value(), Some((&2, &"deux")));
    assert_eq!(map.last_key_value(), Some((&3, &"trois")));
    assert_eq!(map.pop_last(), Some((3, "trois")));
    assert_eq!(map.pop_first(), Some((2, "deux")));
    assert!(map.is_empty());
}

#[test]
fn map_try_insert() {
    let mut map = AvlMap::new();

    *map.try_insert(1, 10).expect("key is absent") += 1;
    assert_eq!(map.get(&1), Some(&11));

    let err = map.try_insert(1, 20).unwrap_err();
    assert_eq!(err.to_string(), "key already present in tree");
    assert_eq!(err.into_item(), (1, 20));
    assert_eq!(map.get(&1), Some(&11));
}

#[test]
fn map_drops_every_value_once() {
    let value = Rc::new(());
    let mut map = AvlMap::new();

    for key in 0..64 {
        map.insert(key, Rc::clone(&value));
    }

    // Overwritten and removed values are released immediately.
    map.insert(10, Rc::clone(&value));
    for key in (0..64).step_by(4) {
        map.remove(&key);
    }
    map.assert_invariants();
    assert_eq!(Rc::strong_count(&value), 1 + map.len());

    drop(map);
    assert_eq!(Rc::strong_count(&value), 1);
}

#[test]
fn btree_equivalence_from_raw_bytes() {
    let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let ops = arbitrary::Unstructured::new(&bytes)
        .arbitrary::<Vec<model::Op>>()
        .expect("any byte string decodes to some ops");
    model::run_btree_equivalence(ops);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }
}
