//! Field path module - Locations of nodes inside a value tree.
//!
//! Matches found by the image matcher carry a [`Path`] instead of a reference,
//! so the tree can be borrowed mutably again when the match is applied.

mod path;

pub use path::*;
