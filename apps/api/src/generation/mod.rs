// Content generation: prompt building, strategy planning, tag parsing,
// self-audit, bounded regeneration, and the Q&A / blog pipelines.
// All LLM calls go through llm_client: no direct vendor calls here.

use serde::Serialize;

use crate::llm_client::LlmError;

pub mod audit;
pub mod blog;
pub mod generator;
pub mod handlers;
pub mod knowledge;
pub mod persona;
pub mod prompts;
pub mod sections;
pub mod strategy;

#[cfg(test)]
pub mod testing;

/// Why a pipeline step fell back to canned output. Logged separately so a
/// dead vendor and a vendor returning junk can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// Vendor unreachable, rate limited on every key, or non-OK status.
    Unavailable,
    /// Vendor answered but the payload was unusable.
    Malformed,
}

impl From<&LlmError> for DegradeReason {
    fn from(err: &LlmError) -> Self {
        if err.is_malformed() {
            DegradeReason::Malformed
        } else {
            DegradeReason::Unavailable
        }
    }
}

/// Where the returned content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum ContentSource {
    Model,
    Fallback(DegradeReason),
}
