//! Error types for the pre-persist identifier hook.
//!
//! Every variant is fatal at the call site: a persist must never proceed
//! with a record that should have received an identifier and did not.

use std::any::TypeId;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for identifier assignment at the persistence boundary.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// An entity type reached the dynamic hook without being registered.
    ///
    /// The assignment table is built once at startup; an unknown type here
    /// means the wiring is wrong, not the data.
    #[error("entity type {type_id:?} has no registered identifier field")]
    Unregistered { type_id: TypeId },

    /// A registered accessor could not read or write the entity it was
    /// registered for.
    #[error("identifier field on `{type_name}` could not be accessed")]
    FieldAccess { type_name: &'static str },

    /// Underlying id generation failed.
    #[error("id generation failed: {0}")]
    IdGeneration(#[from] firn::Error),
}
