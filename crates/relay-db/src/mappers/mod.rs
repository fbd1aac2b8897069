//! Model to entity mappers
//!
//! `From<Model> for Entity` converts database rows to domain objects.

mod block;
mod mapping;
mod user;
mod verification;
