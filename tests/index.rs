use orderflow::{Index, ProcessingError};

fn idx<const N: usize>(c: [usize; N]) -> Index {
    Index::from(c)
}

#[test]
fn after_empty_index_is_never_after() {
    assert!(!Index::default().after(&Index::default()));
    assert!(!Index::default().after(&idx([0])));
    assert!(idx([0]).after(&Index::default()));
}

#[test]
fn after_same_level() {
    assert!(idx([1, 2, 3]).after(&idx([1, 2, 2])));
    assert!(!idx([1, 2, 2]).after(&idx([1, 2, 3])));
    assert!(!idx([1, 2, 3]).after(&idx([1, 2, 3])));
    assert!(idx([2]).after(&idx([1])));
}

#[test]
fn after_deeper() {
    assert!(idx([1, 2, 3]).after(&idx([1, 2])));
    assert!(!idx([1, 2, 3]).after(&idx([1, 3])));
    assert!(idx([2, 0]).after(&idx([1])));
}

#[test]
fn after_shallower() {
    assert!(!idx([1, 2]).after(&idx([1, 2, 3])));
    assert!(idx([1, 3]).after(&idx([1, 2, 3])));
    assert!(idx([2]).after(&idx([1, 9, 9])));
}

#[test]
fn after_is_a_strict_order() {
    let all = [idx([0]), idx([0, 0]), idx([0, 1]), idx([0, 1, 0]), idx([1]), idx([1, 0]), idx([2])];
    for (i, a) in all.iter().enumerate() {
        assert!(!a.after(a), "{a} must not be after itself");
        for b in &all[i + 1..] {
            assert!(b.after(a), "{b} must be after {a}");
            assert!(!a.after(b), "{a} must not be after {b}");
        }
    }
}

#[test]
fn next_of_empty_descends() {
    assert_eq!(Index::default().next(None, 0), idx([0]));
}

#[test]
fn next_increments_last_component() {
    assert_eq!(idx([1]).next(None, 0), idx([2]));
    assert_eq!(idx([1]).next(Some(3), 0), idx([2]));
    assert_eq!(idx([1, 0]).next(Some(3), 0), idx([1, 1]));
}

#[test]
fn next_with_children_descends() {
    assert_eq!(idx([1]).next(None, 2), idx([1, 0]));
    assert_eq!(idx([1, 2]).next(Some(3), 2), idx([1, 2, 0]));
}

#[test]
fn next_ascends_at_bound() {
    assert_eq!(idx([1, 2]).next(Some(3), 0), idx([2]));
    assert_eq!(idx([4, 0]).next(Some(1), 0), idx([5]));
}

#[test]
fn next_unbounded_never_ascends() {
    assert_eq!(idx([1, 2]).next(None, 0), idx([1, 3]));
}

#[test]
fn next_is_after_its_receiver() {
    let cases = [
        (idx([0]), None, 0),
        (idx([0]), None, 3),
        (idx([3, 1]), Some(2), 0),
        (idx([3, 0]), Some(2), 0),
        (idx([3, 0, 4]), Some(9), 1),
    ];
    for (i, max, sub) in cases {
        let n = i.next(max, sub);
        assert!(n.after(&i), "{n} must be after {i}");
    }
}

#[test]
fn validate_rejects_out_of_bound_last_component() {
    assert_eq!(idx([1, 2]).validate(Some(3)), Ok(()));
    assert_eq!(idx([1, 2]).validate(None), Ok(()));
    assert_eq!(
        idx([1, 3]).validate(Some(3)),
        Err(ProcessingError::IndexOutOfBounds { index: idx([1, 3]), max: 3 })
    );
}

#[test]
fn display_and_accessors() {
    let i = idx([1, 2, 3]);
    assert_eq!(i.to_string(), "[1,2,3]");
    assert_eq!(i.depth(), 3);
    assert_eq!(i.last(), Some(3));
    assert_eq!(i.child(0), idx([1, 2, 3, 0]));
    assert_eq!(Index::top(7).components(), &[7]);
}
