//! Wire types exchanged with the observatory logbook backend.

pub mod types;

pub use types::{NamedRef, TargetPayload, TelescopeStats};
