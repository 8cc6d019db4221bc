//! Backoff schedule and the handler trait every task type implements
//! (spec §4.6).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::Application;
use crate::error::KoditResult;

/// `min(300, 5 * 2^retry_count)` seconds (spec §4.6, §8 T2/S5): 5, 10, 20,
/// 40, 80, 160, 300, 300, ...
pub fn backoff_seconds(retry_count: u32) -> i64 {
    let exp = 5i64.saturating_mul(1i64 << retry_count.min(10));
    exp.min(300)
}

pub fn next_retry_at(retry_count: u32) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::seconds(backoff_seconds(retry_count))
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, app: &Application, payload: &serde_json::Value) -> KoditResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_monotonic_and_capped() {
        let mut previous = 0;
        for retry in 0..10 {
            let delay = backoff_seconds(retry);
            assert!(delay >= previous);
            assert!(delay <= 300);
            previous = delay;
        }
    }

    #[test]
    fn matches_spec_schedule() {
        assert_eq!(backoff_seconds(0), 5);
        assert_eq!(backoff_seconds(1), 10);
        assert_eq!(backoff_seconds(2), 20);
        assert_eq!(backoff_seconds(3), 40);
        assert_eq!(backoff_seconds(6), 300);
    }
}
