//! Stop flag shared with background tasks.

use tokio::sync::watch;

/// Owner side of the stop flag. Once triggered it stays triggered, so a task
/// that subscribes late still observes it.
#[derive(Debug)]
pub struct Shutdown {
    flag: watch::Sender<bool>,
}

/// Task side of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    flag: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            flag: watch::Sender::new(false),
        }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            flag: self.flag.subscribe(),
        }
    }

    /// Raise the flag. Returns how many tasks were subscribed.
    pub fn trigger(&self) -> usize {
        self.flag.send_replace(true);
        self.flag.receiver_count()
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolves once the flag is raised, or when the owner is dropped.
    pub async fn wait(&mut self) {
        let _ = self.flag.wait_for(|stopped| *stopped).await;
    }
}
