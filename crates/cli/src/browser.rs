use loopauth_core::BrowserLauncher;
use loopauth_domain::Result;
use loopauth_infra::SystemBrowser;

/// Prints the authorization URL, then hands it to the system browser unless
/// launching is disabled.
pub struct PrintingBrowser {
    launch: bool,
    system: SystemBrowser,
}

impl PrintingBrowser {
    pub const fn new(launch: bool) -> Self {
        Self { launch, system: SystemBrowser }
    }
}

impl BrowserLauncher for PrintingBrowser {
    fn open(&self, url: &str) -> Result<()> {
        eprintln!("Open this URL to authorize:\n\n  {url}\n");
        if self.launch {
            self.system.open(url)
        } else {
            Ok(())
        }
    }
}
