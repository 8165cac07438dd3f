//! Row structs and DTOs.
//!
//! Each submodule holds the `FromRow` + `Serialize` entity structs for one
//! table group. Create/update DTOs exist only where this core writes rows
//! itself; tables owned by the external CRUD layer are read-only here.

pub mod digest;
pub mod event;
pub mod notification;
pub mod pull_request;
pub mod team;
pub mod user;
