//! CLI command implementations.

pub(crate) mod filter;

pub(crate) use filter::FilterArgs;
