//! Reload signal
//!
//! "Apply new settings" tears the running instance down and rebuilds it
//! from a fresh settings snapshot inside the same process. The handle marks
//! the intent, lets the HTTP response flush, then cancels the server's
//! shutdown token.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct ReloadHandle {
    token: CancellationToken,
    reload: Arc<AtomicBool>,
}

impl ReloadHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            reload: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Asks the main loop to rebuild the instance
    pub fn request_reload(&self) {
        info!("Reload requested");
        self.reload.store(true, Ordering::SeqCst);

        let token = self.token.clone();
        tokio::spawn(async move {
            // Let the in-flight response reach the client first
            tokio::time::sleep(SHUTDOWN_GRACE).await;
            token.cancel();
        });
    }

    pub fn reload_requested(&self) -> bool {
        self.reload.load(Ordering::SeqCst)
    }
}
