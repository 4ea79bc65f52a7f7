//! Persistence adapters implementing [`crate::domain::ports::EntityRepository`].
//!
//! Adapters are thin: they own identifier generation, stamping, the version
//! check and soft-delete filtering, and nothing else. The in-memory adapter is
//! the one wired by the server binary.

mod in_memory_entity_repository;

pub use in_memory_entity_repository::InMemoryEntityRepository;
