//! Image module - Finding and bumping container image tags in values trees.
//!
//! Two conventions are recognised:
//!
//! - structured blocks: a map with `repository: <image>` and `tag: <version>`
//! - inline references: a map value `"<image>:<version>"`
//!
//! [`find_matches`] locates both in one walk; [`apply`] rewrites them.

mod directive;
mod matcher;
mod rewriter;


pub use directive::*;
pub use matcher::*;
pub use rewriter::*;
