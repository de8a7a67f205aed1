use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 搜尋設定中的一筆任務
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTask {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl SearchTask {
    pub fn new(category: &str, keyword: Option<&str>) -> Self {
        Self {
            category: category.to_string(),
            keyword: keyword.map(str::to_string),
        }
    }
}

/// 搜尋結果中的原始商品，隨即用來查詢詳細資料
#[derive(Debug, Clone, PartialEq)]
pub struct ListingCandidate {
    pub asin: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub asin: String,
    pub title: Option<String>,
    pub current_price: Option<f64>,
    /// Saving basis：平台回報的原價
    pub original_price: Option<f64>,
    pub merchant: Option<String>,
    pub image_url: Option<String>,
    pub detail_page_url: Option<String>,
}

/// 通過折扣檢查的商品。持久化後不再變動。
///
/// 只有 `asin` 為必要欄位，舊版結果檔缺少的欄位以預設值讀入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRecord {
    pub asin: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub original_price: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// 各發佈目標的結果，鍵為目標名稱
    #[serde(default)]
    pub published: BTreeMap<String, bool>,
    #[serde(default = "Utc::now")]
    pub found_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl DiscountRecord {
    pub fn with_outcomes(mut self, outcomes: BTreeMap<String, bool>, at: DateTime<Utc>) -> Self {
        self.published = outcomes;
        self.published_at = Some(at);
        self
    }

    pub fn any_published(&self) -> bool {
        self.published.values().any(|ok| *ok)
    }

    /// 有嘗試發佈但全部失敗
    pub fn all_failed(&self) -> bool {
        !self.published.is_empty() && !self.any_published()
    }
}

/// 折扣檢查的拒絕原因
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    ThirdPartyMerchant { merchant: Option<String> },
    MissingPrice,
    NoDiscount { current: f64, original: f64 },
    BelowMinimum { percent: f64, min: f64 },
    AboveMaximum { percent: f64, max: f64 },
    InflatedReference { ratio: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ThirdPartyMerchant { merchant } => write!(
                f,
                "third-party merchant ({})",
                merchant.as_deref().unwrap_or("unknown")
            ),
            Rejection::MissingPrice => write!(f, "missing or invalid price"),
            Rejection::NoDiscount { current, original } => {
                write!(f, "no discount (current {} >= original {})", current, original)
            }
            Rejection::BelowMinimum { percent, min } => {
                write!(f, "discount {:.1}% below minimum {}%", percent, min)
            }
            Rejection::AboveMaximum { percent, max } => {
                write!(f, "discount {:.1}% at or above maximum {}%", percent, max)
            }
            Rejection::InflatedReference { ratio } => {
                write!(f, "reference price {:.2}x current price", ratio)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DiscountRecord {
        DiscountRecord {
            asin: "B000TEST01".to_string(),
            title: "Test".to_string(),
            current_price: 8000.0,
            original_price: 10000.0,
            discount_amount: 2000.0,
            discount_percent: 20.0,
            url: "https://x/y".to_string(),
            image_url: None,
            published: BTreeMap::new(),
            found_at: Utc::now(),
            published_at: None,
        }
    }

    #[test]
    fn test_outcome_helpers() {
        let unpublished = record();
        assert!(!unpublished.any_published());
        assert!(!unpublished.all_failed());

        let mut outcomes = BTreeMap::new();
        outcomes.insert("x".to_string(), false);
        outcomes.insert("threads".to_string(), false);
        let failed = record().with_outcomes(outcomes.clone(), Utc::now());
        assert!(failed.all_failed());

        outcomes.insert("x".to_string(), true);
        let partial = record().with_outcomes(outcomes, Utc::now());
        assert!(partial.any_published());
        assert!(!partial.all_failed());
    }

    #[test]
    fn test_record_json_omits_empty_optionals() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("image_url").is_none());
        assert!(json.get("published_at").is_none());
        assert_eq!(json["discount_percent"], 20.0);
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::AboveMaximum {
            percent: 88.88,
            max: 80.0,
        };
        assert_eq!(rejection.to_string(), "discount 88.9% at or above maximum 80%");
    }
}
