//! Cancellable one-shot timer backing temporary level overrides

use super::error::{LoggerError, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Runs a callback once after a delay unless cancelled first.
///
/// The timer thread waits on a channel nobody ever sends on; dropping the
/// handle disconnects it and the callback is skipped. Cancelling after the
/// callback already ran is a no-op.
#[derive(Debug)]
pub struct RollbackTimer {
    cancel: Option<Sender<()>>,
}

impl RollbackTimer {
    pub fn schedule<F>(delay: Duration, on_fire: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel, wait) = bounded::<()>(0);

        thread::Builder::new()
            .name("log-level-rollback".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = wait.recv_timeout(delay) {
                    on_fire();
                }
            })
            .map_err(|e| {
                LoggerError::io_operation("scheduling level rollback", "cannot spawn timer thread", e)
            })?;

        Ok(Self {
            cancel: Some(cancel),
        })
    }

    /// Stop the timer; idempotent
    pub fn cancel(&mut self) {
        self.cancel.take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for RollbackTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
