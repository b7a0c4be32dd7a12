use crate::ftree::Tuple;
use std::cmp::Ordering;

#[test]
fn unassigned_tuple_renders_placeholder() {
    let t = Tuple::new();
    assert!(!t.is_assigned());
    assert_eq!(t.to_string(), "INDEX.NOT.ASSIGNED");
    assert_eq!(Tuple::default(), Tuple::UNASSIGNED);
}

#[test]
fn display_stops_at_first_free_byte() {
    let t = Tuple::from_bytes([0, 3, 1, 0xFF, 7, 0xFF, 0xFF, 0xFF]);
    assert!(t.is_assigned());
    assert_eq!(t.to_string(), "0.3.1");
    // 多次渲染结果相同
    assert_eq!(t.to_string(), t.to_string());
}

#[test]
fn first_tuple_zeroes_indices_up_to_rank() {
    let t = Tuple::first(2);
    assert_eq!(t.bytes(), &[2, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(t.rank(), 2);
    assert_eq!(t.to_string(), "2.0.0");
}

#[test]
fn order_is_lexicographic_and_total() {
    let a = Tuple::from_bytes([1, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    let b = Tuple::from_bytes([1, 1, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    let c = Tuple::from_bytes([2, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

    assert_eq!(a.cmp(&a), Ordering::Equal);
    assert!(a < b && b < c && a < c);
    assert_eq!(b.cmp(&a), Ordering::Greater);
    // 未分配的排在所有已分配之后
    assert!(c < Tuple::UNASSIGNED);

    let mut sorted = vec![c, Tuple::UNASSIGNED, b, a];
    sorted.sort();
    assert_eq!(sorted, vec![a, b, c, Tuple::UNASSIGNED]);
}

#[test]
fn key_round_trip_preserves_tuple() {
    for t in [
        Tuple::first(0),
        Tuple::first(3),
        Tuple::from_bytes([4, 1, 2, 3, 4, 0xFF, 0xFF, 0xFF]),
    ] {
        assert_eq!(Tuple::from_key(t.to_key()), t);
    }
    assert_ne!(Tuple::first(1).to_key(), Tuple::first(2).to_key());
}

#[test]
fn with_rejects_out_of_range_index() {
    let t = Tuple::first(1);
    assert_eq!(t.with(8, 0), None);
    let changed = t.with(1, 5).expect("index 1");
    assert_eq!(changed.bytes()[1], 5);
    assert_eq!(changed.to_string(), "1.5");
}
