use crate::core::category;
use crate::core::evaluator::DiscountEvaluator;
use crate::domain::model::{DiscountRecord, SearchTask};
use crate::domain::ports::MarketplaceApi;
use std::collections::HashSet;
use std::time::Duration;

/// 接受的折扣百分比區間 `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountBand {
    pub min_percent: f64,
    pub max_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub tasks: usize,
    pub failed_tasks: usize,
    pub candidates: usize,
    pub missing_details: usize,
    pub rejected: usize,
    pub accepted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// 依折扣率由高到低排序
    pub records: Vec<DiscountRecord>,
    pub stats: SearchStats,
}

/// 依序執行搜尋任務、逐筆取得商品詳細資料並做折扣檢查
pub struct SearchOrchestrator<M: MarketplaceApi> {
    api: M,
    evaluator: DiscountEvaluator,
    band: DiscountBand,
    request_interval: Duration,
}

impl<M: MarketplaceApi> SearchOrchestrator<M> {
    pub fn new(
        api: M,
        evaluator: DiscountEvaluator,
        band: DiscountBand,
        request_interval: Duration,
    ) -> Self {
        Self {
            api,
            evaluator,
            band,
            request_interval,
        }
    }

    pub async fn collect(&self, tasks: &[SearchTask]) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let mut examined: HashSet<String> = HashSet::new();
        let mut detail_calls = 0usize;

        for task in tasks {
            outcome.stats.tasks += 1;
            let search_index = category::normalize(&task.category);
            let keyword = task.keyword.as_deref().filter(|k| !k.trim().is_empty());

            tracing::info!(
                "🔍 Searching category={}{}",
                search_index,
                keyword.map(|k| format!(", keyword={}", k)).unwrap_or_default()
            );

            let candidates = match self.api.search_items(search_index, keyword).await {
                Ok(candidates) if !candidates.is_empty() => candidates,
                Ok(_) => {
                    tracing::warn!("⚠️ No search results for category={}", search_index);
                    outcome.stats.failed_tasks += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Search failed for category={}: {}", search_index, e);
                    outcome.stats.failed_tasks += 1;
                    continue;
                }
            };

            let mut accepted_in_task = 0usize;
            for candidate in candidates {
                if !examined.insert(candidate.asin.clone()) {
                    tracing::debug!("↩️ {} already examined this run", candidate.asin);
                    continue;
                }
                outcome.stats.candidates += 1;

                if detail_calls > 0 && !self.request_interval.is_zero() {
                    tokio::time::sleep(self.request_interval).await;
                }
                detail_calls += 1;

                let detail = match self.api.get_item(&candidate.asin).await {
                    Ok(Some(detail)) => detail,
                    Ok(None) => {
                        tracing::debug!(
                            "🕳️ No detail for {} ({}), skipping",
                            candidate.asin,
                            candidate.title.as_deref().unwrap_or("untitled")
                        );
                        outcome.stats.missing_details += 1;
                        continue;
                    }
                    Err(e) => {
                        if e.is_transient() {
                            tracing::warn!("⚠️ Detail fetch failed for {}: {}", candidate.asin, e);
                        } else {
                            tracing::error!("❌ Detail fetch failed for {}: {}", candidate.asin, e);
                        }
                        outcome.stats.missing_details += 1;
                        continue;
                    }
                };

                match self
                    .evaluator
                    .evaluate(&detail, self.band.min_percent, self.band.max_percent)
                {
                    Ok(record) => {
                        tracing::info!(
                            "💰 {} {:.1}% off: {}",
                            record.asin,
                            record.discount_percent,
                            record.title
                        );
                        accepted_in_task += 1;
                        outcome.records.push(record);
                    }
                    Err(rejection) => {
                        tracing::warn!("🚫 {} rejected: {}", detail.asin, rejection);
                        outcome.stats.rejected += 1;
                    }
                }
            }

            tracing::info!(
                "✅ category={} done, {} discounted items",
                search_index,
                accepted_in_task
            );
        }

        // sort_by 為穩定排序，同折扣率保留原本順序
        outcome
            .records
            .sort_by(|a, b| b.discount_percent.total_cmp(&a.discount_percent));
        outcome.stats.accepted = outcome.records.len();
        outcome
    }
}
