use anyhow::Result;

use preload_bridge::preload::{Edit, EditError, EditList};

#[test]
fn edits_apply_in_offset_order() -> Result<()> {
    let text = "const a = 1;\nconst b = 2;\n";

    let mut forward = EditList::new();
    forward.push(Edit::new(6, 7, "x"))?;
    forward.push(Edit::new(19, 20, "y"))?;
    forward.push(Edit::insert(0, "// head\n"))?;

    let mut backward = EditList::new();
    backward.push(Edit::insert(0, "// head\n"))?;
    backward.push(Edit::new(19, 20, "y"))?;
    backward.push(Edit::new(6, 7, "x"))?;

    let expected = "// head\nconst x = 1;\nconst y = 2;\n";
    assert_eq!(expected, forward.apply(text)?);
    assert_eq!(expected, backward.apply(text)?);
    Ok(())
}

#[test]
fn edits_reject_overlap() -> Result<()> {
    let mut edits = EditList::new();
    edits.push(Edit::remove(4, 10))?;

    assert_eq!(
        Err(EditError::Overlap {
            existing: (4, 10),
            edit: (8, 12)
        }),
        edits.push(Edit::new(8, 12, "x"))
    );
    // insert strictly inside a claimed range
    assert!(edits.push(Edit::insert(6, "x")).is_err());
    // touching ranges and inserts at the boundaries are fine
    edits.push(Edit::new(10, 12, "x"))?;
    edits.push(Edit::insert(4, "y"))?;
    assert_eq!(3, edits.len());
    Ok(())
}

#[test]
fn edits_reject_inserts_at_same_offset() -> Result<()> {
    let mut edits = EditList::new();
    edits.push(Edit::insert(3, "a"))?;
    assert!(edits.push(Edit::insert(3, "b")).is_err());
    assert!(!edits.try_claim(Edit::insert(3, "c")));
    assert!(edits.try_claim(Edit::insert(4, "d")));
    assert_eq!("abcaddef", edits.apply("abcdef")?);
    Ok(())
}

#[test]
fn edits_reject_reversed_range() {
    let mut edits = EditList::new();
    assert_eq!(
        Err(EditError::InvalidRange { start: 5, end: 2 }),
        edits.push(Edit::new(5, 2, ""))
    );
    assert!(edits.is_empty());
}

#[test]
fn edits_out_of_bounds() -> Result<()> {
    let mut edits = EditList::new();
    edits.push(Edit::new(2, 9, ""))?;
    assert_eq!(
        Err(EditError::OutOfBounds { offset: 9, len: 5 }),
        edits.apply("hello")
    );

    // offsets must fall on character boundaries
    let mut edits = EditList::new();
    edits.push(Edit::insert(1, "x"))?;
    assert!(edits.apply("é").is_err());
    Ok(())
}

#[test]
fn edits_empty_list_is_identity() -> Result<()> {
    let edits = EditList::new();
    assert_eq!("unchanged", edits.apply("unchanged")?);
    Ok(())
}
