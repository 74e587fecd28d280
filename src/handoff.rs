//! Rendezvous channel between the health prober and the warden
//!
//! Tokio has no zero-capacity channel, so each value travels with a oneshot
//! acknowledgement: `send` resolves only once the receiver has taken the value.
//! At most one classification is ever in flight.

use tokio::sync::{mpsc, oneshot};

use crate::connection::Classification;
use crate::error::{Error, Result};

type Envelope = (Classification, oneshot::Sender<()>);

/// Create a connected sender/receiver pair
pub fn channel() -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

/// Prober side of the handoff
pub struct HandoffSender {
    tx: mpsc::Sender<Envelope>,
}

impl HandoffSender {
    /// Deliver a classification, waiting until the receiver accepts it.
    ///
    /// If the future is dropped after the value was queued, the receiver
    /// still gets it; only the acknowledgement is lost.
    pub async fn send(&self, classification: Classification) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send((classification, ack_tx))
            .await
            .map_err(|_| Error::HandoffClosed)?;
        ack_rx.await.map_err(|_| Error::HandoffClosed)
    }
}

/// Warden side of the handoff
pub struct HandoffReceiver {
    rx: mpsc::Receiver<Envelope>,
}

impl HandoffReceiver {
    /// Wait for the next classification. `None` once the prober is gone.
    pub async fn recv(&mut self) -> Option<Classification> {
        let (classification, ack) = self.rx.recv().await?;
        // The prober may have been cancelled while waiting
        let _ = ack.send(());
        Some(classification)
    }
}
