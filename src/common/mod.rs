//! Contains datastructures and utility functions
//! common to both the `compiler` and `vm`.
//!
//! - Source code representation and span annotations.
//! - Runtime data and the literals that produce it.
//! - The escaping contracts of the template format.

pub mod closure;
pub mod data;
pub mod escape;
pub mod lit;
pub mod source;
pub mod span;

pub use closure::{Closure, Native};
pub use data::Data;
pub use source::Source;
pub use span::{Span, Spanned};
