use crate::core::message;
use crate::domain::model::DiscountRecord;
use crate::domain::ports::Publisher;
use std::collections::BTreeMap;
use std::time::Duration;

/// 將商品發佈到所有設定的平台，各平台結果互不影響
pub struct PublisherDispatch {
    targets: Vec<Box<dyn Publisher>>,
    simulate: bool,
    interval: Duration,
    attempts: usize,
}

impl PublisherDispatch {
    pub fn new(targets: Vec<Box<dyn Publisher>>, simulate: bool, interval: Duration) -> Self {
        Self {
            targets,
            simulate,
            interval,
            attempts: 0,
        }
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name()).collect()
    }

    pub fn is_simulated(&self) -> bool {
        self.simulate
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// 回傳每個平台的成功與否
    pub async fn publish(&mut self, record: &DiscountRecord) -> BTreeMap<String, bool> {
        let mut outcomes = BTreeMap::new();

        for index in 0..self.targets.len() {
            let ok = self.publish_to(index, record).await;
            outcomes.insert(self.targets[index].name().to_string(), ok);
        }

        outcomes
    }

    async fn publish_to(&mut self, index: usize, record: &DiscountRecord) -> bool {
        let target = &self.targets[index];
        let name = target.name().to_string();

        let text = match message::compose(record, target.char_limit()) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("❌ {}: cannot build message for {}: {}", name, record.asin, e);
                return false;
            }
        };

        if self.simulate {
            tracing::info!(
                "🧪 [simulate] {} would post ({} chars):\n{}",
                name,
                text.chars().count(),
                text
            );
            return true;
        }

        // 連續發佈之間固定間隔
        if self.attempts > 0 && !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.attempts += 1;

        let target = &self.targets[index];
        match target.publish(&text, record.image_url.as_deref()).await {
            Ok(()) => {
                tracing::info!("📣 Posted to {}: {}", name, preview(&record.title));
                true
            }
            Err(e) => {
                tracing::error!("❌ {} post failed for {}: {}", name, record.asin, e);
                false
            }
        }
    }
}

fn preview(title: &str) -> String {
    let short: String = title.chars().take(30).collect();
    if short.chars().count() < title.chars().count() {
        format!("{}...", short)
    } else {
        short
    }
}
