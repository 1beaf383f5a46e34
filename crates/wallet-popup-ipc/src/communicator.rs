use tokio::sync::watch;

use crate::{message::ClientConfigMessage, traits::CommunicationBackend};

/// Owns the lifecycle of the messaging channel to one popup instance:
/// opening, the observable `connected` flag, sending envelopes, and teardown.
///
/// The communicator knows nothing about handshake semantics.
/// [`PopupConfigurator`](crate::PopupConfigurator) layers the protocol state
/// machine on top of the minimal contract exposed here.
pub struct PopupCommunicator<Com>
where
    Com: CommunicationBackend,
{
    backend: Com,
    connected: watch::Sender<bool>,
}

impl<Com> PopupCommunicator<Com>
where
    Com: CommunicationBackend,
{
    /// Wrap a platform channel. The communicator starts disconnected.
    pub fn new(backend: Com) -> Self {
        let (connected, _) = watch::channel(false);
        Self { backend, connected }
    }

    /// Mark the channel usable. Called once whatever underlying setup makes
    /// sending meaningful has completed.
    pub fn connect(&self) {
        self.connected.send_replace(true);
        log::debug!("Popup channel connected");
    }

    /// Whether the channel is currently usable.
    pub fn connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Observe `connected` transitions without polling.
    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    /// Serialize and deliver an envelope to the popup.
    ///
    /// Fire-and-forget: serialization and delivery failures are logged, not
    /// surfaced. Acknowledgement, if any, arrives later as a separate
    /// incoming envelope.
    pub async fn send(&self, message: ClientConfigMessage) {
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Failed to serialize config message: {e}");
                return;
            }
        };
        if let Err(e) = self.backend.send(payload).await {
            log::error!("Failed to deliver config message: {e}");
        }
    }

    /// Tear the channel down. Safe to call multiple times and from any
    /// state. Returns whether this call performed the transition, so that
    /// disconnect handling runs exactly once per disconnect.
    pub fn disconnect(&self) -> bool {
        let was_connected = self.connected.send_replace(false);
        if was_connected {
            log::debug!("Popup channel disconnected");
        }
        was_connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        message::{ClientConfigEvent, ClientConfigEventType, ConfigMessage},
        traits::communication_backend::tests::TestCommunicationBackend,
    };

    fn communicator() -> (PopupCommunicator<TestCommunicationBackend>, TestCommunicationBackend) {
        let backend = TestCommunicationBackend::new();
        (PopupCommunicator::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn starts_disconnected_and_connect_flips_the_flag() {
        let (communicator, _) = communicator();

        assert!(!communicator.connected());
        communicator.connect();
        assert!(communicator.connected());
    }

    #[tokio::test]
    async fn disconnect_reports_the_transition_exactly_once() {
        let (communicator, _) = communicator();
        communicator.connect();

        assert!(communicator.disconnect());
        assert!(!communicator.disconnect());
        assert!(!communicator.connected());
    }

    #[tokio::test]
    async fn disconnect_before_connect_is_a_no_op() {
        let (communicator, _) = communicator();

        assert!(!communicator.disconnect());
        assert!(!communicator.connected());
    }

    #[tokio::test]
    async fn connected_transitions_are_observable() {
        let (communicator, _) = communicator();
        let mut observer = communicator.subscribe_connected();

        communicator.connect();
        observer.changed().await.unwrap();
        assert!(*observer.borrow());

        communicator.disconnect();
        observer.changed().await.unwrap();
        assert!(!*observer.borrow());
    }

    #[tokio::test]
    async fn send_serializes_the_envelope_to_the_backend() {
        let (communicator, backend) = communicator();
        communicator.connect();

        let message = ConfigMessage::new(ClientConfigEvent {
            event_type: ClientConfigEventType::SelectConnectionType,
            value: None,
        });
        communicator.send(message.clone()).await;

        let outgoing = backend.outgoing().await;
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0], serde_json::to_string(&message).unwrap());
    }
}
