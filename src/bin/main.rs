use cordyceps_avl::AvlMap;

fn print_graph(map: &AvlMap<u32, u32>, name: &str) {
    let mut graph = String::new();
    map.dotgraph(name, &mut graph)
        .expect("writing to a String cannot fail");
    println!("{graph}");
}

fn main() {
    let mut map = AvlMap::new();

    // Ascending inserts only ever need single rotations.
    for key in 1..=7 {
        map.insert(key, key * 10);
        map.assert_invariants();
        print_graph(&map, &format!("insert-{key}"));
    }

    assert_eq!(map.height(), 3);
    assert!(map.equal_paths());

    // The root has two children, so its predecessor takes its place.
    assert_eq!(map.remove(&4), Some(40));
    map.assert_invariants();
    print_graph(&map, "remove-4");

    assert_eq!(map.insert(3, 33), Some(30));
    assert_eq!(map.get(&3), Some(&33));

    let first = map.pop_first();
    assert_eq!(first, Some((1, 10)));
    map.assert_invariants();
    print_graph(&map, "pop-first");

    drop(map);
}
