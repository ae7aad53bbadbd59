use url::Url;

/// Cookie record attributes applied to every consent cookie write.
pub const COOKIE_PATH: &str = "/";
pub const COOKIE_SAME_SITE: &str = "Lax";

/// Main engine configuration. Controls cookie lifetime and the optional
/// reporting endpoint.
#[derive(Debug, Clone)]
pub struct ConsentConfig {
    /// Lifetime of the consent cookie records, in days.
    pub cookie_ttl_days: u32,
    /// Endpoint that receives the best-effort consent report. `None` disables
    /// remote reporting entirely.
    pub report_endpoint: Option<Url>,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            cookie_ttl_days: 365,
            report_endpoint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_is_one_year() {
        let cfg = ConsentConfig::default();
        assert_eq!(cfg.cookie_ttl_days, 365);
        assert!(cfg.report_endpoint.is_none());
    }
}
