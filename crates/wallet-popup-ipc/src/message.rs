//! The configuration message protocol exchanged with the popup.
//!
//! Every unit of exchange is a [`ConfigMessage`] envelope wrapping one event.
//! Event types form a closed enumeration partitioned into two disjoint
//! subsets: [`HostConfigEvent`] (popup to host) and client-bound events
//! (host to popup, [`ClientConfigEventType`]).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator separating configuration envelopes from other message
/// families carried on the same channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// A configuration envelope.
    #[serde(rename = "config")]
    Config,
}

/// One discrete typed message unit exchanged over the channel.
///
/// Wire shape: `{ "kind": "config", "id": <uuid>, "event": { "type": ..., "value"?: ... } }`.
/// The `id` is fresh per envelope and never reused. It is reserved for
/// request/response correlation but not checked on receipt; correlation today
/// is purely by event type and program state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMessage<E> {
    /// Message family discriminator.
    pub kind: MessageKind,
    /// Fresh unique identifier for this envelope.
    pub id: Uuid,
    /// The event carried by this envelope.
    pub event: E,
}

impl<E> ConfigMessage<E> {
    /// Wrap an event in a fresh-id envelope.
    pub fn new(event: E) -> Self {
        Self {
            kind: MessageKind::Config,
            id: Uuid::new_v4(),
            event,
        }
    }
}

/// An envelope originating from the popup.
pub type HostConfigMessage = ConfigMessage<HostConfigEvent>;

/// An envelope destined for the popup.
pub type ClientConfigMessage = ConfigMessage<ClientConfigEvent>;

/// Events the popup may send to the host.
///
/// Unrecognized event types deserialize to [`HostConfigEvent::Unknown`] and
/// cause no state change, keeping the protocol forward compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HostConfigEvent {
    /// Handshake step 1: the popup has attached its message listener.
    PopupListenerAdded,
    /// Handshake step 4: the popup is ready to receive requests.
    PopupReadyForRequest,
    /// The user picked a signing backend inside the popup.
    ConnectionTypeSelected(SignerType),
    /// The popup needs the fallback-link URL from the host.
    RequestWalletLinkUrl,
    /// The popup window is going away.
    PopupUnload,
    /// Any event type outside the closed enumeration.
    #[serde(other)]
    Unknown,
}

/// Event types the host may send to the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientConfigEventType {
    /// Ask the popup to let the user choose a signing backend.
    SelectConnectionType,
    /// Handshake step 2: confirm the host's origin, carrying SDK metadata.
    DappOriginMessage,
    /// Deliver the fallback-link URL the popup asked for.
    WalletLinkUrl,
}

/// A client-bound event with its optional payload position.
///
/// Only `selectConnectionType` and `dappOriginMessage` accept a payload
/// through [`PopupConfigurator::post_client_config_message`]; the restriction
/// is enforced there, before any envelope is built.
///
/// [`PopupConfigurator::post_client_config_message`]: crate::PopupConfigurator::post_client_config_message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfigEvent {
    /// The event type.
    #[serde(rename = "type")]
    pub event_type: ClientConfigEventType,
    /// Optional payload; omitted from the wire when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Opaque identifier for the signing backend the user selected.
///
/// The protocol carries it between popup and host without interpreting it;
/// its concrete members are the business of the signer layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerType(pub String);

impl From<&str> for SignerType {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Display for SignerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload of the `dappOriginMessage` handshake step, helping the popup
/// confirm which host it is talking to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginConfirmation {
    /// Version of the SDK running on the host page.
    pub sdk_version: String,
}

impl OriginConfirmation {
    /// Metadata for the running crate version.
    pub fn current() -> Self {
        Self {
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
