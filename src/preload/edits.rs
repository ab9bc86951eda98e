//! Position tracked edits against an immutable source text.
//!
//! Every edit is expressed in offsets of the original text so that
//! edits computed by different passes never shift one another; the
//! list is applied in a single pass once all passes have run.
use std::error::Error as StdError;
use std::fmt;

/// Replace the bytes in `start..end` with `replacement`.
///
/// An edit where `start == end` is an insertion.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Edit {
    /// Start byte offset in the original text.
    pub start: usize,
    /// End byte offset (exclusive) in the original text.
    pub end: usize,
    /// Replacement text.
    pub replacement: String,
}

impl Edit {
    /// Create a new edit.
    pub fn new<S: Into<String>>(start: usize, end: usize, replacement: S) -> Self {
        Edit {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    /// Insert text at an offset.
    pub fn insert<S: Into<String>>(at: usize, text: S) -> Self {
        Edit::new(at, at, text)
    }

    /// Remove a range.
    pub fn remove(start: usize, end: usize) -> Self {
        Edit::new(start, end, "")
    }

    fn is_insert(&self) -> bool {
        self.start == self.end
    }

    /// Determine if two edits claim the same part of the text.
    pub fn overlaps(&self, other: &Edit) -> bool {
        match (self.is_insert(), other.is_insert()) {
            (true, true) => self.start == other.start,
            (true, false) => other.start < self.start && self.start < other.end,
            (false, true) => self.start < other.start && other.start < self.end,
            (false, false) => self.start < other.end && other.start < self.end,
        }
    }
}

/// Errors raised by an edit list.
#[derive(Debug, Eq, PartialEq)]
pub enum EditError {
    /// An edit claims text already claimed by another edit.
    Overlap { existing: (usize, usize), edit: (usize, usize) },
    /// The end of an edit is before its start.
    InvalidRange { start: usize, end: usize },
    /// An edit falls outside of the text or splits a character.
    OutOfBounds { offset: usize, len: usize },
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overlap { existing, edit } => write!(
                f,
                "edit {}..{} overlaps edit {}..{}",
                edit.0, edit.1, existing.0, existing.1
            ),
            Self::InvalidRange { start, end } => {
                write!(f, "edit range {}..{} is reversed", start, end)
            }
            Self::OutOfBounds { offset, len } => write!(
                f,
                "edit offset {} is not a valid position in text of length {}",
                offset, len
            ),
        }
    }
}

impl StdError for EditError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        None
    }
}

/// Collection of non-overlapping edits.
#[derive(Debug, Default, Clone)]
pub struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    /// Create an empty edit list.
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of edits in the list.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Determine if the list has no edits.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Add an edit, rejecting it when it overlaps an existing edit.
    pub fn push(&mut self, edit: Edit) -> Result<(), EditError> {
        if edit.end < edit.start {
            return Err(EditError::InvalidRange {
                start: edit.start,
                end: edit.end,
            });
        }
        if let Some(existing) = self.edits.iter().find(|e| e.overlaps(&edit)) {
            return Err(EditError::Overlap {
                existing: (existing.start, existing.end),
                edit: (edit.start, edit.end),
            });
        }
        self.edits.push(edit);
        Ok(())
    }

    /// Add an edit unless it conflicts with the list, returns whether
    /// the edit was accepted.
    pub fn try_claim(&mut self, edit: Edit) -> bool {
        match self.push(edit) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("dropping edit: {}", e);
                false
            }
        }
    }

    /// Apply all edits to the text they were computed against.
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        let mut edits = self.edits.iter().collect::<Vec<_>>();
        edits.sort_by_key(|e| (e.start, e.end));

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for edit in edits {
            for offset in &[edit.start, edit.end] {
                if *offset > text.len() || !text.is_char_boundary(*offset) {
                    return Err(EditError::OutOfBounds {
                        offset: *offset,
                        len: text.len(),
                    });
                }
            }
            out.push_str(&text[cursor..edit.start]);
            out.push_str(&edit.replacement);
            cursor = edit.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}
