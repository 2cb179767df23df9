// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    /// Flips to `true` once the task ran; closes if it was aborted
    done: watch::Receiver<bool>,
}

/// Runs only the most recently scheduled task, once the quiescence window
/// has passed without another `schedule` call
///
/// Dropping the debouncer aborts whatever is still pending.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<Pending>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `task` to run after the quiescence window, replacing any
    /// task that has not finished yet
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let (done_tx, done) = watch::channel(false);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
            done_tx.send_replace(true);
        });

        let previous = self.lock().replace(Pending { handle, done });
        if let Some(previous) = previous {
            previous.handle.abort();
        }
    }

    /// Abort the pending task, returning whether there was one
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(pending) => {
                let was_running = !pending.handle.is_finished();
                pending.handle.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    /// Wait until the pending task (if any) has run or was aborted
    ///
    /// The task stays owned by the debouncer while waiting, so dropping
    /// this future early leaves it abortable.
    pub async fn flush(&self) {
        let done = self.lock().as_ref().map(|pending| pending.done.clone());
        if let Some(mut done) = done {
            // An aborted task drops its sender, which ends the wait as well
            let _ = done.wait_for(|finished| *finished).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.handle.abort();
        }
    }
}
