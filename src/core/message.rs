use crate::domain::model::DiscountRecord;
use crate::utils::error::{DiscountError, Result};

const ELLIPSIS: &str = "...";
const HASHTAGS: &str = "#Amazonセール #お買い得 #タイムセール";

/// 依固定範本組出貼文。超過字數上限時只縮短標題，價格與網址保持原樣。
pub fn compose(record: &DiscountRecord, limit: usize) -> Result<String> {
    let full = render(record, &record.title);
    let full_len = full.chars().count();
    if full_len <= limit {
        return Ok(full);
    }

    let title_len = record.title.chars().count();
    let fixed_len = full_len - title_len;
    let ellipsis_len = ELLIPSIS.chars().count();
    if fixed_len + ellipsis_len > limit {
        return Err(DiscountError::MessageTooLong {
            limit,
            len: fixed_len + ellipsis_len,
        });
    }

    let keep = limit - fixed_len - ellipsis_len;
    let short_title: String = record
        .title
        .chars()
        .take(keep)
        .chain(ELLIPSIS.chars())
        .collect();
    tracing::debug!(
        "✂️ Title shortened from {} to {} chars to fit {}",
        title_len,
        keep,
        limit
    );

    Ok(render(record, &short_title))
}

fn render(record: &DiscountRecord, title: &str) -> String {
    format!(
        "🔥【{:.1}%オフ】Amazon割引情報🔥\n\n\
         {}\n\n\
         ✅ 現在価格: {}円\n\
         ❌ 元の価格: {}円\n\
         💰 割引額: {}円\n\n\
         🛒 商品ページ: {}\n\n\
         {}",
        record.discount_percent,
        title,
        format_amount(record.current_price),
        format_amount(record.original_price),
        format_amount(record.discount_amount),
        record.url,
        HASHTAGS
    )
}

/// 四捨五入到整數並加上千分位
pub fn format_amount(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(title: &str) -> DiscountRecord {
        DiscountRecord {
            asin: "B000TEST01".to_string(),
            title: title.to_string(),
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
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(8000.0), "8,000");
        assert_eq!(format_amount(1234567.4), "1,234,567");
        assert_eq!(format_amount(-2500.0), "-2,500");
    }

    #[test]
    fn test_short_message_is_unchanged() {
        let message = compose(&record("イヤホン"), 280).unwrap();

        assert!(message.starts_with("🔥【20.0%オフ】Amazon割引情報🔥"));
        assert!(message.contains("\n\nイヤホン\n\n"));
        assert!(message.contains("✅ 現在価格: 8,000円"));
        assert!(message.contains("❌ 元の価格: 10,000円"));
        assert!(message.contains("💰 割引額: 2,000円"));
        assert!(message.contains("🛒 商品ページ: https://x/y"));
        assert!(message.ends_with(HASHTAGS));
    }

    #[test]
    fn test_long_title_is_truncated_only() {
        let title = "超高音質ワイヤレスイヤホン".repeat(30);
        let message = compose(&record(&title), 280).unwrap();

        assert!(message.chars().count() <= 280);
        assert!(message.contains("✅ 現在価格: 8,000円\n"));
        assert!(message.contains("❌ 元の価格: 10,000円\n"));
        assert!(message.contains("💰 割引額: 2,000円\n"));
        assert!(message.contains("🛒 商品ページ: https://x/y\n"));
        assert!(message.contains("...\n\n✅"));
        assert!(!message.contains(&title));
    }

    #[test]
    fn test_truncation_fills_limit_exactly() {
        let title = "a".repeat(1000);
        let message = compose(&record(&title), 280).unwrap();
        assert_eq!(message.chars().count(), 280);
    }

    #[test]
    fn test_limit_too_small_for_fixed_parts() {
        let err = compose(&record("title"), 40).unwrap_err();
        assert!(matches!(err, DiscountError::MessageTooLong { limit: 40, .. }));
    }
}
