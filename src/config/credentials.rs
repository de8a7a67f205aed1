use crate::utils::error::{DiscountError, Result};
use crate::utils::validation::{self, Validate};
use std::fmt;

pub const PA_API_KEY: &str = "PA_API_KEY";
pub const PA_API_SECRET: &str = "PA_API_SECRET";
pub const PARTNER_TAG: &str = "PARTNER_TAG";
pub const X_ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
pub const THREADS_ACCESS_TOKEN: &str = "THREADS_ACCESS_TOKEN";
pub const THREADS_USER_ID: &str = "THREADS_USER_ID";

#[derive(Clone, PartialEq)]
pub struct MarketplaceCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub partner_tag: String,
}

impl MarketplaceCredentials {
    /// 寬鬆模式下的佔位憑證，API 呼叫會失敗並被記錄
    pub fn placeholder() -> Self {
        Self {
            access_key: "unset".to_string(),
            secret_key: "unset".to_string(),
            partner_tag: "unset-22".to_string(),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct ThreadsCredentials {
    pub access_token: String,
    pub user_id: String,
}

/// 所有外部服務的憑證。發佈平台的憑證為選用，未設定即停用該平台。
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub marketplace: Option<MarketplaceCredentials>,
    pub x_access_token: Option<String>,
    pub threads: Option<ThreadsCredentials>,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 寬鬆模式：商品 API 憑證不完整時只記錄警告，發佈平台的憑證照常讀入
    pub fn from_env_relaxed() -> Self {
        Self::from_lookup_relaxed(|name| std::env::var(name).ok())
    }

    /// 從任意來源讀取；空字串視為未設定
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::read(lookup, false)
    }

    pub fn from_lookup_relaxed<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 寬鬆模式不會回傳錯誤
        Self::read(lookup, true).unwrap_or_default()
    }

    fn read<F>(lookup: F, relaxed: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let key = get(PA_API_KEY);
        let secret = get(PA_API_SECRET);
        let tag = get(PARTNER_TAG);

        let marketplace = match (key, secret, tag) {
            (Some(access_key), Some(secret_key), Some(partner_tag)) => {
                Some(MarketplaceCredentials {
                    access_key,
                    secret_key,
                    partner_tag,
                })
            }
            (None, None, None) => None,
            (key, secret, _) => {
                let missing = if key.is_none() {
                    PA_API_KEY
                } else if secret.is_none() {
                    PA_API_SECRET
                } else {
                    PARTNER_TAG
                };
                if !relaxed {
                    return Err(DiscountError::MissingCredentialError {
                        name: missing.to_string(),
                    });
                }
                tracing::warn!("⚠️ {} is not set, marketplace credentials ignored", missing);
                None
            }
        };

        let threads = match (get(THREADS_ACCESS_TOKEN), get(THREADS_USER_ID)) {
            (Some(access_token), Some(user_id)) => Some(ThreadsCredentials {
                access_token,
                user_id,
            }),
            (Some(_), None) => {
                tracing::warn!("⚠️ {} is set without {}, Threads disabled", THREADS_ACCESS_TOKEN, THREADS_USER_ID);
                None
            }
            (None, Some(_)) => {
                tracing::warn!("⚠️ {} is set without {}, Threads disabled", THREADS_USER_ID, THREADS_ACCESS_TOKEN);
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            marketplace,
            x_access_token: get(X_ACCESS_TOKEN),
            threads,
        })
    }

    /// 商品 API 憑證為必要
    pub fn require_marketplace(&self) -> Result<&MarketplaceCredentials> {
        self.marketplace
            .as_ref()
            .ok_or_else(|| DiscountError::MissingCredentialError {
                name: PA_API_KEY.to_string(),
            })
    }

    pub fn enabled_targets(&self) -> Vec<&'static str> {
        let mut targets = Vec::new();
        if self.x_access_token.is_some() {
            targets.push("x");
        }
        if self.threads.is_some() {
            targets.push("threads");
        }
        targets
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<()> {
        let marketplace = self.require_marketplace()?;
        validation::validate_non_empty_string(PA_API_KEY, &marketplace.access_key)?;
        validation::validate_non_empty_string(PA_API_SECRET, &marketplace.secret_key)?;
        validation::validate_non_empty_string(PARTNER_TAG, &marketplace.partner_tag)?;
        validation::validate_optional_secret(X_ACCESS_TOKEN, &self.x_access_token)?;
        Ok(())
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}***", visible)
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field(
                "access_key",
                &self.marketplace.as_ref().map(|m| mask(&m.access_key)),
            )
            .field(
                "partner_tag",
                &self.marketplace.as_ref().map(|m| m.partner_tag.as_str()),
            )
            .field("x", &self.x_access_token.is_some())
            .field("threads", &self.threads.as_ref().map(|t| t.user_id.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_full_credentials() {
        let creds = Credentials::from_lookup(lookup(&[
            (PA_API_KEY, "AKIDEXAMPLE"),
            (PA_API_SECRET, "secret"),
            (PARTNER_TAG, "tag-22"),
            (X_ACCESS_TOKEN, "x-token"),
            (THREADS_ACCESS_TOKEN, "th-token"),
            (THREADS_USER_ID, "12345"),
        ]))
        .unwrap();

        assert!(creds.validate().is_ok());
        assert_eq!(creds.enabled_targets(), vec!["x", "threads"]);
        assert_eq!(creds.require_marketplace().unwrap().partner_tag, "tag-22");
    }

    #[test]
    fn test_partial_marketplace_credentials_name_missing_one() {
        let err = Credentials::from_lookup(lookup(&[
            (PA_API_KEY, "AKIDEXAMPLE"),
            (PARTNER_TAG, "tag-22"),
        ]))
        .unwrap_err();

        match err {
            DiscountError::MissingCredentialError { name } => assert_eq!(name, PA_API_SECRET),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_relaxed_partial_marketplace_keeps_publishers() {
        let creds = Credentials::from_lookup_relaxed(lookup(&[
            (PA_API_KEY, "AKIDEXAMPLE"),
            (X_ACCESS_TOKEN, "x-token"),
            (THREADS_ACCESS_TOKEN, "th-token"),
            (THREADS_USER_ID, "12345"),
        ]));

        assert!(creds.marketplace.is_none());
        assert_eq!(creds.x_access_token.as_deref(), Some("x-token"));
        assert_eq!(creds.enabled_targets(), vec!["x", "threads"]);
    }

    #[test]
    fn test_relaxed_full_credentials_unchanged() {
        let pairs = [
            (PA_API_KEY, "AKIDEXAMPLE"),
            (PA_API_SECRET, "secret"),
            (PARTNER_TAG, "tag-22"),
        ];
        assert_eq!(
            Credentials::from_lookup_relaxed(lookup(&pairs)),
            Credentials::from_lookup(lookup(&pairs)).unwrap()
        );
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let creds = Credentials::from_lookup(lookup(&[
            (PA_API_KEY, ""),
            (PA_API_SECRET, "  "),
            (PARTNER_TAG, ""),
            (X_ACCESS_TOKEN, ""),
        ]))
        .unwrap();

        assert!(creds.marketplace.is_none());
        assert!(creds.enabled_targets().is_empty());
        assert!(creds.validate().is_err());
    }

    #[test]
    fn test_threads_needs_both_values() {
        let creds =
            Credentials::from_lookup(lookup(&[(THREADS_ACCESS_TOKEN, "th-token")])).unwrap();
        assert!(creds.threads.is_none());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let creds = Credentials::from_lookup(lookup(&[
            (PA_API_KEY, "AKIDEXAMPLE"),
            (PA_API_SECRET, "very-secret"),
            (PARTNER_TAG, "tag-22"),
        ]))
        .unwrap();

        let printed = format!("{:?}", creds);
        assert!(printed.contains("AKID***"));
        assert!(!printed.contains("very-secret"));
    }
}
