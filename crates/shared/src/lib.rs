//! Record types, wire envelope and error taxonomy shared by the staff directory client.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod record;
