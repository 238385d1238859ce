//! Shared usage accounting.
//!
//! One [`UsageStats`] is created per query and shared (via `Arc`) by the
//! routing agent and every sub-agent it invokes. Updates are lock-free
//! `fetch_add`s, so concurrently running agents never lose increments.

use std::fmt;
use std::ops::Add;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cost is stored in micro-dollars so it can live in an atomic integer.
const MICRO_USD: f64 = 1_000_000.0;

/// Usage reported by one reasoning-engine turn.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageDelta {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_usd: f64,
}

impl UsageDelta {
    /// One request with the given token counts and no cost estimate.
    pub fn request(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            requests: 1,
            prompt_tokens,
            completion_tokens,
            cost_usd: 0.0,
        }
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd;
        self
    }
}

/// Atomic accumulator for requests, tokens, tool calls, and estimated cost.
#[derive(Debug, Default)]
pub struct UsageStats {
    requests: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    tool_calls: AtomicU64,
    cost_micro_usd: AtomicU64,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one engine turn's usage.
    pub fn record(&self, delta: UsageDelta) {
        self.requests.fetch_add(delta.requests, Ordering::Relaxed);
        self.prompt_tokens
            .fetch_add(delta.prompt_tokens, Ordering::Relaxed);
        self.completion_tokens
            .fetch_add(delta.completion_tokens, Ordering::Relaxed);
        let micros = (delta.cost_usd.max(0.0) * MICRO_USD).round() as u64;
        self.cost_micro_usd.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn record_tool_call(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            tool_calls: self.tool_calls.load(Ordering::Relaxed),
            cost_micro_usd: self.cost_micro_usd.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of [`UsageStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub tool_calls: u64,
    pub cost_micro_usd: u64,
}

impl UsageSnapshot {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    pub fn cost_usd(&self) -> f64 {
        self.cost_micro_usd as f64 / MICRO_USD
    }
}

impl Add for UsageSnapshot {
    type Output = UsageSnapshot;

    fn add(self, rhs: Self) -> Self {
        UsageSnapshot {
            requests: self.requests + rhs.requests,
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            tool_calls: self.tool_calls + rhs.tool_calls,
            cost_micro_usd: self.cost_micro_usd + rhs.cost_micro_usd,
        }
    }
}

impl fmt::Display for UsageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests: {}, tool calls: {}, tokens: {} prompt + {} completion = {} total, est. cost: ${:.4}",
            self.requests,
            self.tool_calls,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens(),
            self.cost_usd(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn record_accumulates() {
        let stats = UsageStats::new();
        stats.record(UsageDelta::request(1000, 500).with_cost(0.0125));
        stats.record(UsageDelta::request(2000, 1000));
        stats.record_tool_call();

        let snap = stats.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.prompt_tokens, 3000);
        assert_eq!(snap.completion_tokens, 1500);
        assert_eq!(snap.total_tokens(), 4500);
        assert_eq!(snap.tool_calls, 1);
        assert_eq!(snap.cost_micro_usd, 12_500);
    }

    #[test]
    fn summary_format() {
        let stats = UsageStats::new();
        stats.record(UsageDelta::request(10, 5).with_cost(0.5));
        let summary = stats.snapshot().to_string();
        assert_eq!(
            summary,
            "requests: 1, tool calls: 0, tokens: 10 prompt + 5 completion = 15 total, est. cost: $0.5000"
        );
    }

    #[test]
    fn snapshots_add() {
        let a = UsageSnapshot {
            requests: 1,
            prompt_tokens: 10,
            ..Default::default()
        };
        let b = UsageSnapshot {
            requests: 2,
            completion_tokens: 4,
            ..Default::default()
        };
        let sum = a + b;
        assert_eq!(sum.requests, 3);
        assert_eq!(sum.total_tokens(), 14);
    }

    #[tokio::test]
    async fn concurrent_records_are_not_lost() {
        let stats = Arc::new(UsageStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                tokio::spawn(async move {
                    for _ in 0..500 {
                        stats.record(UsageDelta::request(2, 1));
                        stats.record_tool_call();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.requests, 4000);
        assert_eq!(snap.prompt_tokens, 8000);
        assert_eq!(snap.completion_tokens, 4000);
        assert_eq!(snap.tool_calls, 4000);
    }
}
