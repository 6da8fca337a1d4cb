use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Routes Ctrl-C for the interactive session. A single listener serves the
/// whole process: while a reply streams, Ctrl-C cancels that reply; at the
/// prompt it ends the session.
#[derive(Clone, Default)]
pub struct Interrupts {
    in_flight: Arc<Mutex<Option<CancellationToken>>>,
    shutdown: CancellationToken,
}

impl Interrupts {
    /// Token for one send. The next interrupt cancels it.
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut slot) = self.in_flight.lock() {
            *slot = Some(token.clone());
        }
        token
    }

    pub fn end(&self) {
        if let Ok(mut slot) = self.in_flight.lock() {
            *slot = None;
        }
    }

    pub fn interrupt(&self) {
        let in_flight = self.in_flight.lock().ok().and_then(|mut slot| slot.take());
        match in_flight {
            Some(token) => {
                debug!("Interrupt: cancelling the streaming reply");
                token.cancel();
            }
            None => {
                debug!("Interrupt at the prompt: ending the session");
                self.shutdown.cancel();
            }
        }
    }

    /// Cancelled once an interrupt arrives with nothing streaming.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Install the process-wide Ctrl-C listener.
    pub fn listen(&self) -> JoinHandle<()> {
        let interrupts = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                interrupts.interrupt();
            }
        })
    }
}
