pub mod schema;

pub use schema::{Config, GatewayConfig, LlmConfig, ReportConfig, SessionConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexported_config_default_is_constructible() {
        let config = Config::default();

        assert!(!config.llm.base_url.is_empty());
        assert!(config.llm.temperature > 0.0);
        assert!(config.report.message_threshold > 0);
    }
}
