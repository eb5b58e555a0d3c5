//! System browser launcher

use loopauth_core::BrowserLauncher;
use loopauth_domain::{AuthError, Result};
use tracing::debug;

/// Opens URLs with the platform's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        debug!("Opening authorization URL in the system browser");
        open::that_detached(url)
            .map_err(|err| AuthError::Internal(format!("failed to launch browser: {err}")))
    }
}
