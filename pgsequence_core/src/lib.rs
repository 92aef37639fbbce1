//! Pure building blocks of `pgsequence`: identifier quoting, sequence option
//! types with their SQL rendering, the command recorder with its inversion
//! policy and the loader of versioned sequence scripts.

pub mod command;
pub mod ident;
pub mod script;
pub mod sequence;
