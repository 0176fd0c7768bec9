//! Message pump adapter
//!
//! The simulator never calls back into the bridge. It posts a reserved
//! platform message to the host window and waits for someone to drain the
//! connection. This adapter is that someone: hosts forward every platform
//! message they see and it picks out the reserved one.

use sim_api::SimConnector;
use tracing::{trace, warn};

use crate::config::DEFAULT_NOTIFICATION_CODE;
use crate::session::SessionManager;

/// Forwards the "messages waiting" notification to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePumpAdapter {
    notification_code: u32,
}

impl MessagePumpAdapter {
    pub fn new(notification_code: u32) -> Self {
        Self { notification_code }
    }

    pub fn notification_code(&self) -> u32 {
        self.notification_code
    }

    /// Handle one platform message.
    ///
    /// Returns `true` when `code` is the reserved notification, in which
    /// case every waiting message has been drained and routed. Failures end
    /// in a disconnect and are never propagated to the host.
    pub fn on_platform_message<C: SimConnector>(
        &self,
        code: u32,
        session: &mut SessionManager<C>,
    ) -> bool {
        if code != self.notification_code {
            return false;
        }

        match session.receive_pending() {
            Ok(count) => trace!(count, "Drained inbound messages"),
            Err(error) => {
                warn!(%error, "Receive failed");
                // No-op when the session already tore itself down
                session.disconnect();
            }
        }

        true
    }
}

impl Default for MessagePumpAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CODE)
    }
}
