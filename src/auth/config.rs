//! Token lifetime configuration.
//!
//! Lifetimes are explicit constructor input for `TokenManager`, never
//! process-wide globals.

use std::time::Duration;

const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct TokenConfig {
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenConfig {
    /// Defaults: 1 hour access, 7 day refresh.
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        }
    }

    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_lifetimes() {
        let config = TokenConfig::new();
        assert_eq!(config.access_ttl(), Duration::from_secs(3600));
        assert_eq!(config.refresh_ttl(), Duration::from_secs(604_800));
    }

    #[test]
    fn builders_override_defaults() {
        let config = TokenConfig::new()
            .with_access_ttl(Duration::from_secs(5))
            .with_refresh_ttl(Duration::from_secs(10));
        assert_eq!(config.access_ttl(), Duration::from_secs(5));
        assert_eq!(config.refresh_ttl(), Duration::from_secs(10));
    }
}
