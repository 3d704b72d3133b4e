//! Ports (trait boundaries) for external dependencies.
//!
//! The engine itself is pure computation; the only state that outlives a run
//! is the learned initial-state parameter, and this module defines how it is
//! stored. Implementations live in [`crate::adapters`].

pub mod prior_repository;

pub use prior_repository::PriorRepository;
