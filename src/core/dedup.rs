use crate::domain::model::DiscountRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{DiscountError, Result};
use std::collections::HashSet;

pub const DEFAULT_MAX_RETAINED: usize = 100;

/// 已發佈過的商品 ID
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 跨執行的去重紀錄。以 JSON 陣列保存，最新的在前，超過上限的舊紀錄會被捨棄。
pub struct DedupStore<S: Storage> {
    storage: S,
    file_name: String,
    max_retained: usize,
    persisted: Vec<DiscountRecord>,
    seen: SeenSet,
}

impl<S: Storage> DedupStore<S> {
    pub fn new(storage: S, file_name: &str, max_retained: usize) -> Self {
        Self {
            storage,
            file_name: file_name.to_string(),
            max_retained: max_retained.max(1),
            persisted: Vec::new(),
            seen: SeenSet::default(),
        }
    }

    /// 讀取紀錄。不存在或空白視為第一次執行；不是 JSON 陣列時記錄警告並立即以空陣列覆寫。
    pub async fn load(&mut self) -> Result<&SeenSet> {
        let records = match self.storage.read_file(&self.file_name).await {
            Ok(bytes) => self.parse_or_reset(&bytes).await?,
            Err(DiscountError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("📂 No result store at {}, starting fresh", self.file_name);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        self.seen = SeenSet::default();
        for record in &records {
            self.seen.insert(&record.asin);
        }
        self.persisted = records;

        tracing::info!(
            "📂 Loaded {} previously announced items from {}",
            self.seen.len(),
            self.file_name
        );
        Ok(&self.seen)
    }

    /// 只有整份內容不是 JSON 陣列時才重設；個別無法解析的項目略過
    async fn parse_or_reset(&self, bytes: &[u8]) -> Result<Vec<DiscountRecord>> {
        let text = String::from_utf8_lossy(bytes);
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&text) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "⚠️ Result store {} is corrupt ({}), resetting to empty",
                    self.file_name,
                    e
                );
                self.storage.write_file(&self.file_name, b"[]").await?;
                return Ok(Vec::new());
            }
        };

        let total = entries.len();
        let records: Vec<DiscountRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Skipping entry {} of {}: {}",
                        index,
                        self.file_name,
                        e
                    );
                    None
                }
            })
            .collect();

        if records.len() < total {
            tracing::warn!(
                "⚠️ {} of {} entries in {} could not be read",
                total - records.len(),
                total,
                self.file_name
            );
        }
        Ok(records)
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// 僅在本次執行中標記為已處理
    pub fn mark_seen(&mut self, id: &str) {
        self.seen.insert(id);
    }

    pub fn persisted(&self) -> &[DiscountRecord] {
        &self.persisted
    }

    /// 新紀錄放在最前面，截斷至上限後寫回，回傳目前保存的筆數
    pub async fn record(&mut self, new_records: Vec<DiscountRecord>) -> Result<usize> {
        if new_records.is_empty() {
            return Ok(self.persisted.len());
        }

        for record in &new_records {
            self.seen.insert(&record.asin);
        }

        let mut combined = new_records;
        combined.extend(std::mem::take(&mut self.persisted));
        combined.truncate(self.max_retained);

        let json = serde_json::to_string_pretty(&combined)?;
        self.storage.write_file(&self.file_name, json.as_bytes()).await?;
        self.persisted = combined;

        tracing::debug!(
            "💾 Result store now holds {} records",
            self.persisted.len()
        );
        Ok(self.persisted.len())
    }
}
