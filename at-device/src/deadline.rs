//! Transaction deadline

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wall-clock budget for one accumulation window
///
/// Cancels its token once `duration` has elapsed. Dropping the deadline
/// stops the timer and cancels the token at once, so a reader bound to it
/// never outlives its owner.
#[derive(Debug)]
pub struct Deadline {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl Deadline {
    /// Start the timer now
    pub fn start(duration: Duration) -> Self {
        let token = CancellationToken::new();
        let timer = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                token.cancel();
            })
        };
        Self { token, timer }
    }

    /// Token cancelled when the deadline expires
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
        self.token.cancel();
    }
}
