//! Datastructures produced and consumed by the script pipeline:
//! the tokens of a generated script and the tree read from them.

pub mod token;
pub mod tree;
