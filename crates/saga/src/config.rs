//! Saga configuration loaded from environment variables.

/// Template attached to a new group when the caller names none
/// (the Apache-style baseline).
pub const APACHE_STYLE_TEMPLATE_ID: &str = "fb4cc144-a76c-4c17-8a52-c648f158fded";

/// How many pending CLA manager requests the deletion saga removes per
/// company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerRequestCleanup {
    /// Delete only the first pending request and report its outcome.
    /// Any further pending requests are left in place (and logged).
    #[default]
    FirstOnly,
    /// Delete every pending request, reporting the first failure.
    All,
}

impl std::str::FromStr for ManagerRequestCleanup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first_only" => Ok(ManagerRequestCleanup::FirstOnly),
            "all" => Ok(ManagerRequestCleanup::All),
            other => Err(format!("unknown manager request cleanup mode: {other}")),
        }
    }
}

/// Saga configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `CLA_DEFAULT_TEMPLATE_ID`: template used when a create names none
/// - `CLA_MANAGER_REQUEST_CLEANUP`: `first` (default) or `all`
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct SagaConfig {
    pub default_template_id: String,
    pub manager_request_cleanup: ManagerRequestCleanup,
    pub log_level: String,
}

impl SagaConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_template_id: std::env::var("CLA_DEFAULT_TEMPLATE_ID")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_template_id),
            manager_request_cleanup: std::env::var("CLA_MANAGER_REQUEST_CLEANUP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.manager_request_cleanup),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns a copy using the given cleanup mode.
    pub fn with_manager_request_cleanup(mut self, mode: ManagerRequestCleanup) -> Self {
        self.manager_request_cleanup = mode;
        self
    }
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            default_template_id: APACHE_STYLE_TEMPLATE_ID.to_string(),
            manager_request_cleanup: ManagerRequestCleanup::FirstOnly,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SagaConfig::default();
        assert_eq!(config.default_template_id, APACHE_STYLE_TEMPLATE_ID);
        assert_eq!(
            config.manager_request_cleanup,
            ManagerRequestCleanup::FirstOnly
        );
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_cleanup_mode_parsing() {
        assert_eq!(
            "all".parse::<ManagerRequestCleanup>(),
            Ok(ManagerRequestCleanup::All)
        );
        assert_eq!(
            " First ".parse::<ManagerRequestCleanup>(),
            Ok(ManagerRequestCleanup::FirstOnly)
        );
        assert!("some".parse::<ManagerRequestCleanup>().is_err());
    }

    #[test]
    fn test_with_manager_request_cleanup() {
        let config = SagaConfig::default().with_manager_request_cleanup(ManagerRequestCleanup::All);
        assert_eq!(config.manager_request_cleanup, ManagerRequestCleanup::All);
    }
}
