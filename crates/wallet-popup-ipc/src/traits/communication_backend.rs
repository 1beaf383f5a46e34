/// Interface to the raw cross-window messaging channel behind one popup
/// instance. It is up to the platform to implement this trait over whatever
/// transport reaches the popup window; opening and closing the window itself
/// happens outside this crate.
pub trait CommunicationBackend {
    /// Error reported by the underlying transport on delivery failure.
    type SendError: std::fmt::Display;

    /// Deliver one serialized envelope to the popup. Delivery is
    /// fire-and-forget at the protocol layer; acknowledgement, if any,
    /// arrives later as a separate incoming envelope.
    fn send(
        &self,
        message: String,
    ) -> impl std::future::Future<Output = Result<(), Self::SendError>>;
}

#[cfg(test)]
pub mod tests {
    use std::rc::Rc;

    use tokio::sync::RwLock;

    use super::*;

    /// A mock implementation of the CommunicationBackend trait that records
    /// every envelope handed to it.
    #[derive(Debug, Clone, Default)]
    pub struct TestCommunicationBackend {
        outgoing: Rc<RwLock<Vec<String>>>,
    }

    impl TestCommunicationBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get a copy of the serialized envelopes that have been sent.
        pub async fn outgoing(&self) -> Vec<String> {
            self.outgoing.read().await.clone()
        }
    }

    impl CommunicationBackend for TestCommunicationBackend {
        type SendError = std::convert::Infallible;

        async fn send(&self, message: String) -> Result<(), Self::SendError> {
            self.outgoing.write().await.push(message);
            Ok(())
        }
    }
}
