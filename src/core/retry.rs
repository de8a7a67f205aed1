use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 重試策略：最多嘗試次數、基本等待時間與退避倍率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

/// 失敗的種類決定等待方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Transient,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
            backoff_multiplier,
        }
    }

    /// 測試用：不等待
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, 2.0)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// 第 `attempt` 次（從 1 起算）失敗後的等待時間。最後一次失敗後回傳 `None`。
    pub fn delay_after(&self, attempt: u32, kind: FailureKind) -> Option<Duration> {
        if attempt >= self.attempts() {
            return None;
        }

        let delay = match kind {
            FailureKind::RateLimited => {
                let factor = self.backoff_multiplier.max(1.0).powi(attempt as i32 - 1);
                self.base_delay().mul_f64(factor)
            }
            FailureKind::Transient => self.base_delay(),
        };
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1), 2.0);

        assert_eq!(
            policy.delay_after(1, FailureKind::RateLimited),
            Some(Duration::from_secs(1))
        );
        assert_eq!(
            policy.delay_after(2, FailureKind::RateLimited),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            policy.delay_after(3, FailureKind::RateLimited),
            Some(Duration::from_secs(4))
        );
        assert_eq!(policy.delay_after(4, FailureKind::RateLimited), None);
    }

    #[test]
    fn test_transient_delay_is_constant() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.delay_after(1, FailureKind::Transient),
            Some(Duration::from_secs(1))
        );
        assert_eq!(
            policy.delay_after(2, FailureKind::Transient),
            Some(Duration::from_secs(1))
        );
        assert_eq!(policy.delay_after(3, FailureKind::Transient), None);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::immediate(0);
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.delay_after(1, FailureKind::Transient), None);
    }
}
