//! votecast: a ten-model voting ensemble for daily market direction.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and a thin command-line shell in
//! [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
