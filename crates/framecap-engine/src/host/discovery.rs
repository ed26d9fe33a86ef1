use anyhow::{Result, bail};

/// Locates the real host runtime at startup.
///
/// A companion plugin that already holds the runtime takes precedence over a
/// runtime the host exposed globally. Finding neither is fatal: nothing can be
/// paced without the real tick slot.
#[derive(Debug)]
pub struct HostDiscovery<H> {
    companion: Option<H>,
    exposed: Option<H>,
}

impl<H> Default for HostDiscovery<H> {
    fn default() -> Self {
        Self {
            companion: None,
            exposed: None,
        }
    }
}

impl<H> HostDiscovery<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for a host handed over directly.
    pub fn exposed(host: H) -> Self {
        Self::new().with_exposed(host)
    }

    pub fn with_companion(mut self, host: H) -> Self {
        self.companion = Some(host);
        self
    }

    pub fn with_exposed(mut self, host: H) -> Self {
        self.exposed = Some(host);
        self
    }

    pub fn resolve(self) -> Result<H> {
        if let Some(host) = self.companion {
            log::debug!("host runtime obtained from companion plugin");
            return Ok(host);
        }
        if let Some(host) = self.exposed {
            log::debug!("host runtime obtained from exposed global");
            return Ok(host);
        }
        bail!("no host runtime available: neither a companion plugin nor an exposed runtime was provided")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_wins_over_exposed() {
        let host = HostDiscovery::new().with_exposed("global").with_companion("plugin");
        assert_eq!(host.resolve().unwrap(), "plugin");
    }

    #[test]
    fn exposed_is_used_without_companion() {
        assert_eq!(HostDiscovery::exposed(7).resolve().unwrap(), 7);
    }

    #[test]
    fn missing_runtime_is_fatal() {
        let err = HostDiscovery::<u8>::new().resolve().unwrap_err();
        assert!(err.to_string().contains("no host runtime"));
    }
}
