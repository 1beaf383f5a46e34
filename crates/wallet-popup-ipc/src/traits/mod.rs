//! Seams between this crate and the embedding platform.

pub mod communication_backend;

pub use communication_backend::CommunicationBackend;
