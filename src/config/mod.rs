#[cfg(feature = "cli")]
pub mod cli;
pub mod credentials;
pub mod search_config;

use crate::utils::error::Result;
use crate::utils::validation::Validate;
use credentials::Credentials;
use search_config::SearchConfig;

/// 一次執行所需的全部設定，在程式入口建立一次後往下傳遞
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub credentials: Credentials,
    /// 結果檔路徑
    pub results_path: String,
    /// 只產生訊息不實際發佈
    pub dry_run: bool,
}

impl AppConfig {
    pub fn new(
        search: SearchConfig,
        credentials: Credentials,
        results_path: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            search,
            credentials,
            results_path: results_path.into(),
            dry_run,
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.search.validate()?;
        crate::utils::validation::validate_non_empty_string("results_path", &self.results_path)?;
        self.credentials.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credentials::MarketplaceCredentials;

    fn credentials() -> Credentials {
        Credentials {
            marketplace: Some(MarketplaceCredentials::placeholder()),
            ..Credentials::default()
        }
    }

    #[test]
    fn test_app_config_with_placeholder_credentials_is_valid() {
        let config = AppConfig::new(
            SearchConfig::default(),
            credentials(),
            "discount_results.json",
            true,
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_requires_marketplace_credentials() {
        let config = AppConfig::new(
            SearchConfig::default(),
            Credentials::default(),
            "discount_results.json",
            false,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_app_config_rejects_blank_results_path_and_token() {
        let config = AppConfig::new(SearchConfig::default(), credentials(), "  ", false);
        assert!(config.validate().is_err());

        let mut creds = credentials();
        creds.x_access_token = Some(" ".to_string());
        let config = AppConfig::new(SearchConfig::default(), creds, "out.json", false);
        assert!(config.validate().is_err());
    }
}
