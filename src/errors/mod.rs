//! Error types for stack construction.

mod stack_error;

pub use stack_error::StackError;
