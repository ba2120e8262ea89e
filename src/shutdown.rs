//! Ctrl-C handling.
//!
//! The first interrupt cancels the shared token and lets cooperative brews
//! wind down. A second interrupt stops waiting and terminates the process.

use std::future::Future;
use std::io;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Exit code used when the user interrupts twice.
pub const INTERRUPTED: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// The signal source went away before a second interrupt arrived.
    Settled,
    /// A second interrupt arrived after cancellation was requested.
    Terminate,
}

/// Installs the Ctrl-C handler for the process.
pub fn cancel_on_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if watch(token, tokio::signal::ctrl_c).await == Escalation::Terminate {
            std::process::exit(INTERRUPTED);
        }
    })
}

/// Waits on `next_interrupt` and cancels `token` on the first one.
pub async fn watch<F, Fut>(token: CancellationToken, mut next_interrupt: F) -> Escalation
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(err) = next_interrupt().await {
        tracing::warn!(error = %err, "unable to listen for Ctrl-C");
        return Escalation::Settled;
    }

    tracing::warn!("interrupt received, cancelling running brews (press Ctrl-C again to exit)");
    token.cancel();

    match next_interrupt().await {
        Ok(()) => {
            tracing::warn!("second interrupt received, exiting");
            Escalation::Terminate
        }
        Err(_) => Escalation::Settled,
    }
}
