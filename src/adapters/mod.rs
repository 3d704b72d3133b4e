//! Storage backends for [`crate::ports::PriorRepository`].

pub mod in_memory_repository;
pub mod json_repository;
pub mod msgpack_repository;

pub use in_memory_repository::InMemoryPriorRepository;
pub use json_repository::JsonPriorRepository;
pub use msgpack_repository::MsgPackPriorRepository;
