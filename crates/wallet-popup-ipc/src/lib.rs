//! Handshake and request-relay core for popup-based wallet signers.
//!
//! A host page establishes a trusted signer connection with a wallet whose UI
//! runs in a separate, unprivileged popup window. The two sides share no
//! memory; everything travels over a raw cross-window messaging channel that
//! is untyped, asynchronous, and subject to the popup being closed by the
//! user at any time.
//!
//! This crate turns that channel into a reliable, ordered, cancellable signer
//! connection:
//!
//! - [`message`] defines the closed set of typed configuration envelopes.
//! - [`PopupCommunicator`] owns the channel lifecycle to one popup instance
//!   over a platform-provided [`traits::CommunicationBackend`].
//! - [`PopupConfigurator`] drives the handshake state machine, settling the
//!   connection-ready and signer-selection waiters as events arrive.

mod communicator;
mod configurator;
pub mod error;
pub mod message;
pub mod traits;

pub use communicator::PopupCommunicator;
pub use configurator::{HandshakeStage, LinkUrlProvider, PopupConfigurator};
