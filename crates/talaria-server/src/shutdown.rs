//! Graceful shutdown signal handling.
//!
//! This module provides utilities for handling shutdown signals
//! (SIGTERM, SIGINT) in a graceful manner, allowing in-flight
//! requests to complete before termination.
//!
//! # Example
//!
//! ```rust,ignore
//! use talaria_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! shutdown.recv().await;
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

/// A signal that can be used to trigger and await graceful shutdown.
///
/// `ShutdownSignal` coordinates shutdown across tasks. It can be
/// cloned and shared; all clones observe the same trigger.
///
/// # Example
///
/// ```rust
/// use talaria_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let shutdown_clone = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(shutdown_clone.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered shutdown signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Triggers the shutdown signal.
    ///
    /// Notifies every task waiting in [`recv`](Self::recv). Calling
    /// this more than once is safe and idempotent.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` if shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Waits until shutdown is triggered.
    ///
    /// Completes immediately if the signal was already triggered.
    pub async fn recv(&self) {
        let mut receiver = self.sender.subscribe();
        // wait_for only fails when the sender is dropped, and we hold it.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Creates a shutdown signal that listens for OS signals.
    ///
    /// This will trigger on SIGTERM or SIGINT (Ctrl+C).
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let signal_clone = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            signal_clone.trigger();
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for an OS shutdown signal (SIGTERM or SIGINT).
async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm = signal(SignalKind::terminate());
        let sigint = signal(SignalKind::interrupt());

        match (sigterm, sigint) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    }
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT, initiating graceful shutdown");
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to register signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to wait for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    }
}

/// Tracks in-flight connections so shutdown can drain them.
///
/// Each connection holds a [`ConnectionToken`]; once every token has
/// been dropped, [`wait_idle`](Self::wait_idle) completes.
///
/// # Example
///
/// ```rust,ignore
/// use talaria_server::shutdown::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.token();
///
/// tokio::spawn(async move {
///     let _token = token;
///     // serve the connection
/// });
///
/// tracker.wait_idle().await;
/// ```
#[derive(Debug)]
pub struct ConnectionTracker {
    sender: mpsc::Sender<()>,
    receiver: mpsc::Receiver<()>,
}

impl ConnectionTracker {
    /// Creates a new tracker with no live connections.
    #[must_use]
    pub fn new() -> Self {
        // The channel carries no messages; only sender drops matter.
        let (sender, receiver) = mpsc::channel(1);
        Self { sender, receiver }
    }

    /// Issues a token for one connection.
    #[must_use]
    pub fn token(&self) -> ConnectionToken {
        ConnectionToken {
            _sender: self.sender.clone(),
        }
    }

    /// Waits until every issued token has been dropped.
    ///
    /// Completes immediately if no tokens are outstanding.
    pub async fn wait_idle(self) {
        let Self {
            sender,
            mut receiver,
        } = self;
        drop(sender);
        // recv yields None once the last token's sender is gone.
        let _ = receiver.recv().await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A token representing an active connection.
///
/// Dropping the token marks the connection as finished.
#[derive(Debug, Clone)]
pub struct ConnectionToken {
    _sender: mpsc::Sender<()>,
}
