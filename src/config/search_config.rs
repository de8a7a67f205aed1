use crate::core::category;
use crate::core::retry::RetryPolicy;
use crate::domain::model::SearchTask;
use crate::utils::error::{DiscountError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "search_config.toml";

const DEFAULT_CONFIG_HEADER: &str = "\
# discount-finder search configuration
#
# min_discount_percent <= discount < max_discount_percent is accepted.
# failed_publish_policy: \"mark_seen\" (never retry) or \"retry_next_run\".
# Values may reference environment variables as ${NAME}.

";

/// 發佈全部失敗時，是否仍標記為已發佈
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedPublishPolicy {
    #[default]
    MarkSeen,
    RetryNextRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub min_discount_percent: f64,
    pub max_discount_percent: f64,
    pub max_posts_per_run: usize,
    pub max_retained_results: usize,
    pub failed_publish_policy: FailedPublishPolicy,
    pub marketplace: MarketplaceSettings,
    pub retry: RetryPolicy,
    pub pacing: PacingSettings,
    pub publish: PublishSettings,
    pub search_items: Vec<SearchTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceSettings {
    pub base_url: String,
    pub region: String,
    pub marketplace: String,
    pub first_party_merchant: String,
    pub merchant_token: String,
    pub item_count: u32,
    pub default_keywords: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub request_interval_ms: u64,
    pub publish_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub x_api_base: String,
    pub x_char_limit: usize,
    pub threads_api_base: String,
    pub threads_char_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_discount_percent: 20.0,
            max_discount_percent: 80.0,
            max_posts_per_run: 5,
            max_retained_results: crate::core::dedup::DEFAULT_MAX_RETAINED,
            failed_publish_policy: FailedPublishPolicy::default(),
            marketplace: MarketplaceSettings::default(),
            retry: RetryPolicy::default(),
            pacing: PacingSettings::default(),
            publish: PublishSettings::default(),
            search_items: ["Electronics", "Kitchen", "VideoGames", "Apparel", "Beauty"]
                .iter()
                .map(|category| SearchTask::new(category, None))
                .collect(),
        }
    }
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://webservices.amazon.co.jp".to_string(),
            region: "us-west-2".to_string(),
            marketplace: "www.amazon.co.jp".to_string(),
            first_party_merchant: "Amazon.co.jp".to_string(),
            merchant_token: "amazon".to_string(),
            item_count: 10,
            default_keywords: "セール OR 特価".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            request_interval_ms: 1000,
            publish_interval_ms: 5000,
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            x_api_base: "https://api.x.com".to_string(),
            x_char_limit: 280,
            threads_api_base: "https://graph.threads.net/v1.0".to_string(),
            threads_char_limit: 500,
        }
    }
}

/// 預設設定的來源
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultReason {
    Missing,
    Invalid(String),
}

/// `load` 的結果。使用預設值時由呼叫端決定是否寫出預設檔。
#[derive(Debug, Clone)]
pub enum ConfigLoad {
    Loaded(SearchConfig),
    Defaulted {
        config: SearchConfig,
        reason: DefaultReason,
    },
}

impl ConfigLoad {
    pub fn into_config(self) -> SearchConfig {
        match self {
            ConfigLoad::Loaded(config) | ConfigLoad::Defaulted { config, .. } => config,
        }
    }

    /// 只有檔案不存在時才寫出預設檔，格式錯誤的檔案保留給使用者修正
    pub fn needs_persist(&self) -> bool {
        matches!(
            self,
            ConfigLoad::Defaulted {
                reason: DefaultReason::Missing,
                ..
            }
        )
    }
}

impl SearchConfig {
    /// 讀取設定檔。不存在或格式錯誤時回傳預設設定並記錄警告，不會失敗。
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigLoad {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "⚠️ {} not found, using default search configuration",
                    path.display()
                );
                return ConfigLoad::Defaulted {
                    config: Self::default(),
                    reason: DefaultReason::Missing,
                };
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Cannot read {} ({}), using default search configuration",
                    path.display(),
                    e
                );
                return ConfigLoad::Defaulted {
                    config: Self::default(),
                    reason: DefaultReason::Invalid(e.to_string()),
                };
            }
        };

        match Self::from_toml_str(&content).and_then(|config| {
            config.validate()?;
            Ok(config)
        }) {
            Ok(config) => {
                tracing::info!("📋 Loaded search configuration from {}", path.display());
                ConfigLoad::Loaded(config)
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Invalid configuration in {} ({}), using defaults",
                    path.display(),
                    e
                );
                ConfigLoad::Defaulted {
                    config: Self::default(),
                    reason: DefaultReason::Invalid(e.to_string()),
                }
            }
        }
    }

    /// 寫出預設設定檔
    pub fn persist_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let body = toml::to_string_pretty(&Self::default()).map_err(|e| {
            DiscountError::InvalidConfigValueError {
                field: "search_config".to_string(),
                value: path.display().to_string(),
                reason: format!("Cannot serialize default config: {}", e),
            }
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{}{}", DEFAULT_CONFIG_HEADER, body))?;
        tracing::info!("📝 Wrote default search configuration to {}", path.display());
        Ok(())
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${PARTNER_TAG})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DiscountError::InvalidConfigValueError {
            field: "env_substitution".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range(
            "min_discount_percent",
            self.min_discount_percent,
            0.0,
            100.0,
        )?;
        validation::validate_range(
            "max_discount_percent",
            self.max_discount_percent,
            0.0,
            100.0,
        )?;
        if self.min_discount_percent >= self.max_discount_percent {
            return Err(DiscountError::InvalidConfigValueError {
                field: "max_discount_percent".to_string(),
                value: self.max_discount_percent.to_string(),
                reason: format!(
                    "Must be greater than min_discount_percent ({})",
                    self.min_discount_percent
                ),
            });
        }

        validation::validate_positive_number(
            "max_retained_results",
            self.max_retained_results,
            1,
        )?;
        validation::validate_positive_number(
            "retry.max_attempts",
            self.retry.max_attempts as usize,
            1,
        )?;
        validation::validate_url("marketplace.base_url", &self.marketplace.base_url)?;
        validation::validate_url("publish.x_api_base", &self.publish.x_api_base)?;
        validation::validate_url("publish.threads_api_base", &self.publish.threads_api_base)?;
        validation::validate_non_empty_string("marketplace.marketplace", &self.marketplace.marketplace)?;
        validation::validate_range("marketplace.item_count", self.marketplace.item_count, 1, 10)?;

        if self.search_items.is_empty() {
            return Err(DiscountError::InvalidConfigValueError {
                field: "search_items".to_string(),
                value: "[]".to_string(),
                reason: "At least one search item is required".to_string(),
            });
        }
        for (index, task) in self.search_items.iter().enumerate() {
            validation::validate_non_empty_string(
                &format!("search_items[{}].category", index),
                &task.category,
            )?;
            if !category::is_known(&task.category) {
                tracing::warn!(
                    "⚠️ search_items[{}]: unknown category '{}' will search All",
                    index,
                    task.category
                );
            }
        }

        Ok(())
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.pacing.request_interval_ms)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.pacing.publish_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.marketplace.timeout_seconds.max(1))
    }
}

impl Validate for SearchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
