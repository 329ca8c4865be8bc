//! S-expression support for committer.
//!
//! Reads Scheme source structurally, finds the top-level definition that
//! surrounds a changed line, and exposes the handful of fields commit
//! messages are built from.

pub mod definition;
pub mod lookup;
pub mod reader;

pub use definition::{Definition, FieldValue, TrackedField};
pub use lookup::{surrounding_form, TopLevelForm};
pub use reader::{ReadError, Reader, Sexp};
