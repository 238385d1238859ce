//! Correlation IDs and approximate per-model pricing.
//!
//! Every routed query gets one `trace_id`, shared by the sub-agents it
//! delegates to, so log lines from one question can be grepped together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A fresh `tr-<nanos>-<seq>` identifier.
pub fn generate_trace_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("tr-{nanos:x}-{:04x}", SEQ.fetch_add(1, Ordering::Relaxed))
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    pub fn estimate_cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 * self.input_per_million
            + completion_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self::new(3.0, 15.0)
    }
}

// First substring match wins, so more specific names come first.
const PRICE_TABLE: &[(&str, ModelPricing)] = &[
    ("4o-mini", ModelPricing::new(0.15, 0.60)),
    ("gpt-4", ModelPricing::new(2.50, 10.0)),
    ("o1", ModelPricing::new(15.0, 60.0)),
    ("o3", ModelPricing::new(15.0, 60.0)),
    ("opus", ModelPricing::new(15.0, 75.0)),
    ("sonnet", ModelPricing::new(3.0, 15.0)),
    ("haiku", ModelPricing::new(0.25, 1.25)),
    ("granite", ModelPricing::new(0.20, 0.60)),
    ("llama", ModelPricing::new(0.20, 0.60)),
    ("mistral", ModelPricing::new(0.20, 0.60)),
];

/// Pricing for `model`, matched on the part after the provider prefix.
/// Estimates for the usage summary, not billing.
pub fn pricing_for_model(model: &str) -> ModelPricing {
    let name = model.rsplit('/').next().unwrap_or(model).to_lowercase();
    PRICE_TABLE
        .iter()
        .find(|(key, _)| name.contains(key))
        .map(|(_, pricing)| *pricing)
        .unwrap_or_default()
}
