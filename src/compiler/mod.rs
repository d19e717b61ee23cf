//! This module contains the compiler implementation.
//! Note that these modules are public for documentation visiblility,
//! But should never be used outside of the module by `common` or `vm`.
//!
//! Each step in the compiler pipeline turns one datatype into another.
//! loosely, starting with `Source` (string + path):
//!
//! 1. Template: `parse.rs`, driving the regex `Scanner` in `scan.rs`
//! 2. Script:   `gen.rs`, one line per part of the `Template`
//! 3. Tokens:   `lex.rs`
//! 4. Tree:     `read.rs`, which the `vm` walks
//!
//! Static errors from every step are reported as a `Syntax`.

pub mod gen;
pub mod lex;
pub mod parse;
pub mod read;
pub mod scan;
pub mod template;

pub mod syntax;

pub use gen::Compiler;
pub use parse::Parser;
pub use template::{Part, Template};
