//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: storage adapters for auditable records
//!
//! Adapters are thin translators between domain types and their storage
//! representation. They contain no business logic.

pub mod persistence;
