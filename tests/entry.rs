use orderflow::{Entry, Index, ProcessingError};

#[test]
fn builder_defaults_to_valid_leaf() -> anyhow::Result<()> {
    let e = Entry::builder(Index::top(3), "x").try_build()?;
    assert_eq!(e.index, Index::top(3));
    assert!(e.valid);
    assert_eq!(e.max_sub, 0);
    assert_eq!(e.max_index, None);
    assert_eq!(e.valid_value(), Some(&"x"));
    Ok(())
}

#[test]
fn validity_is_and_combined() -> anyhow::Result<()> {
    let e = Entry::builder([0], 1).valid(false).valid(true).try_build()?;
    assert!(!e.valid);
    assert_eq!(e.valid_value(), None);
    Ok(())
}

#[test]
fn nested_entry_needs_max_index() {
    let err = Entry::builder([1, 0], 1).try_build().unwrap_err();
    assert_eq!(err, ProcessingError::MissingMaxIndex { index: Index::from([1, 0]) });
}

#[test]
fn nested_entry_within_bound() -> anyhow::Result<()> {
    let e = Entry::builder([1, 1], 'b').max_index(2).sub_entries(3).try_build()?;
    assert_eq!(e.max_index, Some(2));
    assert_eq!(e.max_sub, 3);
    Ok(())
}

#[test]
fn out_of_bound_entry_is_rejected() {
    let err = Entry::builder([1, 2], 'c').max_index(2).try_build().unwrap_err();
    assert!(matches!(err, ProcessingError::IndexOutOfBounds { max: 2, .. }));
    assert_eq!(err.to_string(), "index [1,2] out of bounds: last component >= max 2");
}

#[test]
fn build_downgrades_invalid_entry_to_tombstone() {
    let e = Entry::builder([1, 5], 'z').max_index(2).build();
    assert_eq!(e.index, Index::from([1, 5]));
    assert!(!e.valid);
    assert_eq!(e.value, None);
    assert_eq!(e.max_index, None);
}

#[test]
fn tombstone_and_top_shorthands() {
    let t: Entry<u8> = Entry::tombstone(Index::from([2, 0]), Some(1));
    assert!(!t.valid);
    assert_eq!(t.max_index, Some(1));
    assert_eq!(Entry::top(4, 9u8).valid_value(), Some(&9));
}
