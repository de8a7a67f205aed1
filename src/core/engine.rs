use crate::config::search_config::FailedPublishPolicy;
use crate::core::dedup::DedupStore;
use crate::core::dispatch::PublisherDispatch;
use crate::core::orchestrator::SearchOrchestrator;
use crate::domain::model::SearchTask;
use crate::domain::ports::{MarketplaceApi, Storage};
use crate::utils::error::Result;
use chrono::Utc;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub max_posts: usize,
    pub failed_publish_policy: FailedPublishPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    pub accepted: usize,
    /// 未曾發佈過的商品數
    pub fresh: usize,
    pub published: usize,
    pub failed: usize,
    /// 超過每次上限而未發佈
    pub deferred: usize,
    pub persisted: usize,
}

/// 一次完整執行：讀取紀錄、搜尋、過濾、發佈、寫回
pub struct DiscountFinder<M: MarketplaceApi, S: Storage> {
    orchestrator: SearchOrchestrator<M>,
    dedup: DedupStore<S>,
    dispatch: PublisherDispatch,
    tasks: Vec<SearchTask>,
    options: RunOptions,
}

impl<M: MarketplaceApi, S: Storage> DiscountFinder<M, S> {
    pub fn new(
        orchestrator: SearchOrchestrator<M>,
        dedup: DedupStore<S>,
        dispatch: PublisherDispatch,
        tasks: Vec<SearchTask>,
        options: RunOptions,
    ) -> Self {
        Self {
            orchestrator,
            dedup,
            dispatch,
            tasks,
            options,
        }
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        tracing::info!(
            "🚀 Starting discount run: {} search tasks, targets: [{}]{}",
            self.tasks.len(),
            self.dispatch.target_names().join(", "),
            if self.dispatch.is_simulated() {
                " (simulate)"
            } else {
                ""
            }
        );

        self.dedup.load().await?;

        let outcome = self.orchestrator.collect(&self.tasks).await;
        let mut summary = RunSummary {
            candidates: outcome.stats.candidates,
            accepted: outcome.stats.accepted,
            persisted: self.dedup.persisted().len(),
            ..RunSummary::default()
        };

        let mut attempted = 0usize;
        for record in outcome.records {
            if self.dedup.is_seen(&record.asin) {
                tracing::debug!("🔁 {} already announced, skipping", record.asin);
                continue;
            }
            summary.fresh += 1;

            let record = if attempted < self.options.max_posts && self.dispatch.has_targets() {
                attempted += 1;
                tracing::info!(
                    "📤 Publishing {}/{}: {} ({:.1}% off)",
                    attempted,
                    self.options.max_posts,
                    record.asin,
                    record.discount_percent
                );
                let outcomes = self.dispatch.publish(&record).await;
                record.with_outcomes(outcomes, Utc::now())
            } else {
                summary.deferred += 1;
                record
            };

            if record.any_published() {
                summary.published += 1;
            } else if record.all_failed() {
                summary.failed += 1;
            }

            // 本次執行內不再重複處理
            self.dedup.mark_seen(&record.asin);

            if record.all_failed()
                && self.options.failed_publish_policy == FailedPublishPolicy::RetryNextRun
            {
                tracing::warn!(
                    "⚠️ {} failed on every target, leaving it for the next run",
                    record.asin
                );
                continue;
            }

            summary.persisted = self.dedup.record(vec![record]).await?;
        }

        if summary.fresh == 0 {
            tracing::info!("📭 No new discounted items found");
        }
        tracing::info!(
            "🏁 Run complete: {} accepted, {} new, {} published, {} failed, {} deferred, {} stored",
            summary.accepted,
            summary.fresh,
            summary.published,
            summary.failed,
            summary.deferred,
            summary.persisted
        );

        Ok(summary)
    }
}
