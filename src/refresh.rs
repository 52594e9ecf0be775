//! Background thread re-fetching the working tree status on a timer.
//!
//! The thread owns its backend for its lifetime and only talks to the
//! interactive side through channels: a stop channel in, changed
//! [`Status`] values out. Consumers apply updates with
//! [`Session::replace_status`](crate::Session::replace_status).

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, tick, unbounded};
use tracing::{debug, info, warn};

use crate::fetch::{FetchOptions, fetch_status};
use crate::git::GitBackend;
use crate::status::Status;

/// Handle to a running refresh thread. Dropping it stops and joins the thread.
pub struct Refresher {
    updates: Receiver<Status>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Refresher {
    /// Start refreshing every `interval`, publishing each status that
    /// differs from the last one seen (starting from `current`).
    pub fn spawn<B>(backend: B, interval: Duration, options: FetchOptions, current: Status) -> Self
    where
        B: GitBackend + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded(0);
        let (update_tx, update_rx) = unbounded();

        let handle = thread::spawn(move || {
            refresh_loop(&backend, interval, &options, current, &stop_rx, &update_tx);
        });

        Self {
            updates: update_rx,
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Channel of changed statuses, oldest first
    pub fn updates(&self) -> &Receiver<Status> {
        &self.updates
    }

    /// The newest pending update, discarding any older ones
    pub fn latest(&self) -> Option<Status> {
        self.updates.try_iter().last()
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        // Disconnecting the stop channel wakes the loop
        drop(self.stop.take());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("refresh thread panicked");
            }
        }
    }
}

fn refresh_loop<B: GitBackend + ?Sized>(
    backend: &B,
    interval: Duration,
    options: &FetchOptions,
    mut last: Status,
    stop: &Receiver<()>,
    updates: &Sender<Status>,
) {
    // The ticker buffers a single tick, so a slow fetch delays rather than
    // stacks the next one
    let ticker = tick(interval);
    debug!(?interval, "refresh started");

    loop {
        select! {
            recv(stop) -> _ => break,
            recv(ticker) -> _ => match fetch_status(backend, options) {
                Ok(status) if status != last => {
                    info!(files = status.len(), "working tree status changed");
                    last = status.clone();
                    if updates.send(status).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "refresh failed, retrying on next tick"),
            },
        }
    }

    debug!("refresh stopped");
}
