use serde_json::Value;
use tokio::sync::{oneshot, Mutex};

use crate::{
    communicator::PopupCommunicator,
    error::ConfigError,
    message::{
        ClientConfigEvent, ClientConfigEventType, ClientConfigMessage, HostConfigEvent,
        HostConfigMessage, OriginConfirmation, SignerType,
    },
    traits::CommunicationBackend,
};

/// Callback producing the fallback-link URL when the popup asks for it.
pub type LinkUrlProvider = Box<dyn Fn() -> String + Send + Sync>;

/// Milestones of the popup handshake, in expected progression.
///
/// The stage is observational: event handling is driven by which waiters are
/// armed and by the communicator's `connected` flag, and the stage records
/// which milestone the connection attempt has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    /// No connection attempt has started yet.
    Idle,
    /// A connection attempt is underway; waiting for the popup to announce
    /// itself.
    Attempting,
    /// Origin confirmation has been sent in reply to the popup's listener
    /// announcement.
    OriginExchanged,
    /// The user has been asked to choose a signing backend.
    SignerPending,
    /// The popup is ready to receive requests; the handshake is complete.
    Ready,
    /// The channel has been torn down. Terminal for this attempt; a new
    /// popup starts a fully fresh configurator.
    Disconnected,
}

struct ConfiguratorState {
    stage: HandshakeStage,
    connection_ready: Option<oneshot::Sender<()>>,
    signer_selection: Option<oneshot::Sender<Result<SignerType, ConfigError>>>,
    link_url_provider: Option<LinkUrlProvider>,
}

/// The protocol state machine for one popup connection attempt.
///
/// Interprets incoming host-bound events, drives the handshake milestones,
/// settles the outstanding waiters, and emits client-bound envelopes through
/// the owned [`PopupCommunicator`]. At most one connection-ready waiter and
/// at most one signer-selection waiter exist at any time; both are single
/// fire and cleared the moment they settle.
pub struct PopupConfigurator<Com>
where
    Com: CommunicationBackend,
{
    communicator: PopupCommunicator<Com>,
    state: Mutex<ConfiguratorState>,
}

impl<Com> PopupConfigurator<Com>
where
    Com: CommunicationBackend,
{
    /// Take ownership of the channel to drive the handshake over it.
    pub fn new(communicator: PopupCommunicator<Com>) -> Self {
        Self {
            communicator,
            state: Mutex::new(ConfiguratorState {
                stage: HandshakeStage::Idle,
                connection_ready: None,
                signer_selection: None,
                link_url_provider: None,
            }),
        }
    }

    /// The communicator backing this connection attempt.
    pub fn communicator(&self) -> &PopupCommunicator<Com> {
        &self.communicator
    }

    /// The handshake milestone this attempt has reached.
    pub async fn stage(&self) -> HandshakeStage {
        self.state.lock().await.stage
    }

    /// Start a connection attempt.
    ///
    /// Arms the connection-ready waiter and returns the suspension that
    /// resolves once the popup reports it is ready to receive requests.
    /// There is no built-in timeout; abandoning the receiver is the caller's
    /// cancellation. If the attempt is torn down first, the receiver observes
    /// the closed channel instead of a value. Calling again replaces any
    /// previous waiter.
    pub async fn start_connection(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;
        state.stage = HandshakeStage::Attempting;
        state.connection_ready = Some(tx);
        rx
    }

    /// Ask the popup to let the user choose a signing backend.
    ///
    /// Sends `selectConnectionType`, arms the signer-selection waiter, and
    /// returns the suspension that resolves with the chosen [`SignerType`],
    /// or with [`ConfigError::UserRejected`] if the channel is torn down
    /// before the user decides.
    pub async fn select_signer_type(
        &self,
    ) -> Result<oneshot::Receiver<Result<SignerType, ConfigError>>, ConfigError> {
        self.post_client_config_message(ClientConfigEventType::SelectConnectionType, None)
            .await?;
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;
        state.stage = HandshakeStage::SignerPending;
        state.signer_selection = Some(tx);
        Ok(rx)
    }

    /// Supply or replace the callback that produces the fallback-link URL.
    /// Required only if a `requestWalletLinkUrl` event is ever received.
    pub async fn set_link_url_provider(
        &self,
        provider: impl Fn() -> String + Send + Sync + 'static,
    ) {
        self.state.lock().await.link_url_provider = Some(Box::new(provider));
    }

    /// Tear down the channel and settle the outstanding waiters.
    ///
    /// Idempotent: the signer-selection waiter is rejected with
    /// [`ConfigError::UserRejected`] at most once, the connection-ready
    /// waiter is discarded without firing, and calling with no waiters armed
    /// is a pure no-op.
    pub async fn disconnect(&self) {
        let transitioned = self.communicator.disconnect();
        let mut state = self.state.lock().await;
        if !transitioned && state.stage == HandshakeStage::Disconnected {
            return;
        }
        state.stage = HandshakeStage::Disconnected;
        // Dropped without firing; the caller's own cancellation observes the
        // closed channel.
        state.connection_ready = None;
        if let Some(selection) = state.signer_selection.take() {
            let _ = selection.send(Err(ConfigError::UserRejected));
        }
    }

    /// Decode one raw envelope received from the channel and dispatch it.
    pub async fn handle_raw(&self, raw: &str) -> Result<(), ConfigError> {
        let message: HostConfigMessage = serde_json::from_str(raw)
            .map_err(|e| ConfigError::Internal(format!("Undecodable config message: {e}")))?;
        self.handle_config_message(message).await
    }

    /// Dispatch one popup-originated envelope.
    ///
    /// All state transitions happen synchronously within this call, so events
    /// from one popup are processed in channel delivery order.
    pub async fn handle_config_message(
        &self,
        message: HostConfigMessage,
    ) -> Result<(), ConfigError> {
        match message.event {
            HostConfigEvent::PopupListenerAdded => {
                // Handshake step 2: confirm the host origin to the popup.
                // Replied regardless of prior stage.
                let value = serde_json::to_value(OriginConfirmation::current())
                    .map_err(|e| ConfigError::Internal(e.to_string()))?;
                self.post_client_config_message(
                    ClientConfigEventType::DappOriginMessage,
                    Some(value),
                )
                .await?;
                let mut state = self.state.lock().await;
                if state.stage == HandshakeStage::Attempting {
                    state.stage = HandshakeStage::OriginExchanged;
                }
            }
            HostConfigEvent::PopupReadyForRequest => {
                // Handshake step 4: the popup can take requests now. A second
                // receipt finds the waiter already cleared and is a no-op.
                let mut state = self.state.lock().await;
                if let Some(ready) = state.connection_ready.take() {
                    let _ = ready.send(());
                }
                state.stage = HandshakeStage::Ready;
                log::debug!("Popup handshake complete");
            }
            HostConfigEvent::ConnectionTypeSelected(signer_type) => {
                // Stale message from a torn-down channel.
                if !self.communicator.connected() {
                    return Ok(());
                }
                let mut state = self.state.lock().await;
                if let Some(selection) = state.signer_selection.take() {
                    let _ = selection.send(Ok(signer_type));
                }
            }
            HostConfigEvent::RequestWalletLinkUrl => {
                if !self.communicator.connected() {
                    return Ok(());
                }
                self.respond_to_link_url_request().await?;
            }
            HostConfigEvent::PopupUnload => {
                self.disconnect().await;
            }
            HostConfigEvent::Unknown => {}
        }
        Ok(())
    }

    /// Build and send a client-bound envelope.
    ///
    /// Enforces the payload restriction before anything reaches the wire:
    /// only `selectConnectionType` and `dappOriginMessage` accept a payload
    /// through this call, and a violation fails with
    /// [`ConfigError::Internal`] without sending.
    pub async fn post_client_config_message(
        &self,
        event_type: ClientConfigEventType,
        value: Option<Value>,
    ) -> Result<(), ConfigError> {
        if value.is_some()
            && !matches!(
                event_type,
                ClientConfigEventType::SelectConnectionType
                    | ClientConfigEventType::DappOriginMessage
            )
        {
            return Err(ConfigError::Internal(
                "Client config event does not accept a payload".to_string(),
            ));
        }

        let message = ClientConfigMessage::new(ClientConfigEvent { event_type, value });
        self.communicator.send(message).await;
        Ok(())
    }

    async fn respond_to_link_url_request(&self) -> Result<(), ConfigError> {
        let url = {
            let state = self.state.lock().await;
            let provider = state
                .link_url_provider
                .as_ref()
                .ok_or_else(|| ConfigError::Internal("Link URL provider not set".to_string()))?;
            provider()
        };

        // The URL travels outside the payload allowance of
        // post_client_config_message, so the envelope is built directly.
        let message = ClientConfigMessage::new(ClientConfigEvent {
            event_type: ClientConfigEventType::WalletLinkUrl,
            value: Some(Value::String(url)),
        });
        self.communicator.send(message).await;
        Ok(())
    }
}
