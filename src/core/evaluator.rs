use crate::domain::model::{DiscountRecord, ProductDetail, Rejection};
use chrono::Utc;
use std::collections::BTreeMap;

/// 原價超過現價此倍數時，視為參考價格灌水
pub const MAX_REFERENCE_RATIO: f64 = 3.0;

const UNKNOWN_TITLE: &str = "不明";

/// 判斷商品是否為可信的折扣
#[derive(Debug, Clone)]
pub struct DiscountEvaluator {
    first_party_merchant: String,
    merchant_token: String,
    marketplace_domain: String,
    partner_tag: String,
}

impl DiscountEvaluator {
    pub fn new(
        first_party_merchant: &str,
        merchant_token: &str,
        marketplace_domain: &str,
        partner_tag: &str,
    ) -> Self {
        Self {
            first_party_merchant: first_party_merchant.to_string(),
            merchant_token: merchant_token.to_lowercase(),
            marketplace_domain: marketplace_domain.to_string(),
            partner_tag: partner_tag.to_string(),
        }
    }

    pub fn is_first_party(&self, merchant: Option<&str>) -> bool {
        match merchant {
            Some(name) => {
                name == self.first_party_merchant
                    || (!self.merchant_token.is_empty()
                        && name.to_lowercase().contains(&self.merchant_token))
            }
            None => false,
        }
    }

    pub fn fallback_url(&self, asin: &str) -> String {
        format!(
            "https://{}/dp/{}?tag={}",
            self.marketplace_domain, asin, self.partner_tag
        )
    }

    pub fn evaluate(
        &self,
        detail: &ProductDetail,
        min_percent: f64,
        max_percent: f64,
    ) -> Result<DiscountRecord, Rejection> {
        if !self.is_first_party(detail.merchant.as_deref()) {
            return Err(Rejection::ThirdPartyMerchant {
                merchant: detail.merchant.clone(),
            });
        }

        let (current, original) = match (detail.current_price, detail.original_price) {
            (Some(current), Some(original)) if current >= 0.0 && original >= 0.0 => {
                (current, original)
            }
            _ => return Err(Rejection::MissingPrice),
        };
        if original <= current {
            return Err(Rejection::NoDiscount { current, original });
        }

        let discount_amount = original - current;
        let discount_percent = discount_amount / original * 100.0;

        if discount_percent < min_percent {
            return Err(Rejection::BelowMinimum {
                percent: discount_percent,
                min: min_percent,
            });
        }
        if discount_percent >= max_percent {
            return Err(Rejection::AboveMaximum {
                percent: discount_percent,
                max: max_percent,
            });
        }

        // 與百分比上限各自獨立檢查
        if original > current * MAX_REFERENCE_RATIO {
            return Err(Rejection::InflatedReference {
                ratio: if current > 0.0 {
                    original / current
                } else {
                    f64::INFINITY
                },
            });
        }

        Ok(DiscountRecord {
            asin: detail.asin.clone(),
            title: detail
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            current_price: current,
            original_price: original,
            discount_amount,
            discount_percent,
            url: detail
                .detail_page_url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| self.fallback_url(&detail.asin)),
            image_url: detail.image_url.clone(),
            published: BTreeMap::new(),
            found_at: Utc::now(),
            published_at: None,
        })
    }
}
