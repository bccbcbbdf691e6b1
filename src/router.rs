//! Model routing
//!
//! Decides which model tier answers a turn. A fixed set of "think hard"
//! phrases always wins: it is checked before any network call and forces the
//! deepest tier. Otherwise one classification request is issued under one of
//! two policies: the binary policy fails open to the cheapest tier on any
//! unexpected output, while the tiered policy treats an invalid label as a
//! hard error since the four-way selection is load-bearing for cost control.

use crate::llm::{CompletionClient, CompletionRequest};
use crate::{Error, Result};

/// Phrases that force the deepest-reasoning tier, matched case-insensitively
pub const THINK_HARD_PHRASES: &[&str] =
    &["think hard", "deep think", "deeply think", "deep thinking"];

/// System instruction for the binary classifier
const BINARY_CLASSIFIER_INSTRUCTION: &str = "You are an assistant that classifies user requests as 'simple' or 'complex'. \
     If the user's request requires math, logic, deep reasoning, or solving complex problems, classify it as 'complex'. \
     If it's a basic question easily answerable without deep thought, classify it as 'simple'. \
     Only reply with 'simple' or 'complex', nothing else.";

/// Response length cap for classification calls
const CLASSIFIER_MAX_TOKENS: u32 = 10;

/// A model-selection bucket with a fixed cost/latency profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// Day-to-day questions and basic requests
    Simple,
    /// Requests that need elaboration or information compaction
    Complex,
    /// Math, logic, and other questions that need reasoning
    Reasoning,
    /// The deepest tier, reserved for explicit think-hard requests
    DeepReasoning,
}

impl ModelTier {
    /// Model identifier sent on the wire
    #[must_use]
    pub const fn wire_id(self) -> &'static str {
        match self {
            Self::Simple => "gpt-4o-mini",
            Self::Complex => "gpt-4o",
            Self::Reasoning => "o1-mini",
            Self::DeepReasoning => "o1-preview",
        }
    }

    /// Fixed response token budget for the tier
    #[must_use]
    pub const fn max_tokens(self) -> u32 {
        match self {
            Self::Simple => 1_000,
            Self::Complex => 1_500,
            Self::Reasoning | Self::DeepReasoning => 15_000,
        }
    }

    /// Whether the tier's model rejects the system role (instructions are
    /// folded into the user message instead)
    #[must_use]
    pub const fn is_reasoning_model(self) -> bool {
        matches!(self, Self::Reasoning | Self::DeepReasoning)
    }
}

/// How classification output is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Two-way simple/complex classification; any unexpected label or
    /// transport failure defaults to the cheapest tier
    #[default]
    Binary,
    /// Four-way tier selection with a strict output contract; an invalid
    /// label is a classification error
    Tiered,
}

/// The model choice for one turn, immutable once made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSelection {
    /// Selected tier
    pub tier: ModelTier,
    /// Whether a think-hard phrase forced the selection
    pub deep_reasoning: bool,
}

/// Check for a think-hard phrase, case-insensitive substring match
#[must_use]
pub fn contains_think_hard(text: &str) -> bool {
    let lowered = text.to_lowercase();
    THINK_HARD_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// Routes user text to a model tier
pub struct ComplexityRouter {
    client: CompletionClient,
    policy: RoutingPolicy,
    classifier_model: String,
}

impl ComplexityRouter {
    /// Create a new router
    #[must_use]
    pub fn new(client: CompletionClient, policy: RoutingPolicy, classifier_model: String) -> Self {
        Self {
            client,
            policy,
            classifier_model,
        }
    }

    /// Classify user text into a model selection.
    ///
    /// The think-hard check runs before any network call and short-circuits
    /// classification entirely under the binary policy.
    ///
    /// # Errors
    ///
    /// Returns `Error::Classification` for an invalid label under the
    /// tiered policy. The binary policy never fails.
    pub async fn classify(&self, text: &str) -> Result<ModelSelection> {
        match self.policy {
            RoutingPolicy::Binary => Ok(self.classify_binary(text).await),
            RoutingPolicy::Tiered => self.classify_tiered(text).await,
        }
    }

    /// Binary policy: fail open toward the cheaper path, never fail closed
    /// into the expensive model.
    async fn classify_binary(&self, text: &str) -> ModelSelection {
        if contains_think_hard(text) {
            tracing::info!("think-hard phrase detected, selecting deepest tier");
            return ModelSelection {
                tier: ModelTier::DeepReasoning,
                deep_reasoning: true,
            };
        }

        let request = CompletionRequest {
            model: &self.classifier_model,
            system: Some(BINARY_CLASSIFIER_INSTRUCTION),
            user: text,
            max_tokens: CLASSIFIER_MAX_TOKENS,
            temperature: None,
        };

        let tier = match self.client.complete(request).await {
            Ok(label) => parse_binary_label(&label).unwrap_or_else(|| {
                tracing::warn!(label = %label, "unexpected classifier label, defaulting to simple");
                ModelTier::Simple
            }),
            Err(e) => {
                tracing::warn!(error = %e, "classification failed, defaulting to simple");
                ModelTier::Simple
            }
        };

        tracing::info!(tier = ?tier, "complexity determined");
        ModelSelection {
            tier,
            deep_reasoning: false,
        }
    }

    /// Tiered policy: strict four-way selection, think-hard applied as an
    /// upgrade after classification.
    async fn classify_tiered(&self, text: &str) -> Result<ModelSelection> {
        let prompt = tier_selection_prompt(text);
        let request = CompletionRequest {
            model: &self.classifier_model,
            system: None,
            user: &prompt,
            max_tokens: CLASSIFIER_MAX_TOKENS,
            temperature: Some(0.0),
        };

        let label = self.client.complete(request).await?;
        let tier = parse_tier_label(&label)?;

        if contains_think_hard(text) && tier != ModelTier::DeepReasoning {
            tracing::info!(classified = ?tier, "think-hard phrase upgrades selection");
            return Ok(ModelSelection {
                tier: ModelTier::DeepReasoning,
                deep_reasoning: true,
            });
        }

        tracing::info!(tier = ?tier, "model selected");
        Ok(ModelSelection {
            tier,
            deep_reasoning: tier == ModelTier::DeepReasoning && contains_think_hard(text),
        })
    }
}

/// Build the four-way selection prompt
fn tier_selection_prompt(user_text: &str) -> String {
    format!(
        "You are an assistant that decides which model to use for a given user request. \
         Below are the models and their use cases:\n\n\
         - **gpt-4o-mini**: Day-to-day questions and super basic stuff.\n\
         - **gpt-4o**: Complex questions that require more elaboration on the response or require compacting information.\n\
         - **o1-mini**: For code-related questions, math questions, things that require logic, and hard questions that need deep reasoning.\n\
         - **o1-preview**: Only when the sentiment 'think hard' is in the prompt.\n\n\
         User's request:\n\"\"\"\n{user_text}\n\"\"\"\n\n\
         Which model should we use for this situation? Only reply with the model name: \
         'gpt-4o-mini', 'gpt-4o', 'o1-mini', or 'o1-preview'. Do not include any other text."
    )
}

/// Interpret a binary classifier label; `None` for anything unexpected
fn parse_binary_label(label: &str) -> Option<ModelTier> {
    match label.trim().to_lowercase().as_str() {
        "simple" => Some(ModelTier::Simple),
        "complex" => Some(ModelTier::Complex),
        _ => None,
    }
}

/// Interpret a four-way tier label under the strict contract
fn parse_tier_label(label: &str) -> Result<ModelTier> {
    match label.trim().to_lowercase().as_str() {
        "gpt-4o-mini" => Ok(ModelTier::Simple),
        "gpt-4o" => Ok(ModelTier::Complex),
        "o1-mini" => Ok(ModelTier::Reasoning),
        "o1-preview" => Ok(ModelTier::DeepReasoning),
        other => Err(Error::Classification(format!(
            "invalid model label: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(policy: RoutingPolicy) -> ComplexityRouter {
        // The base URL is unroutable; tests only exercise paths that never
        // reach the network.
        let client =
            CompletionClient::new("test-key".to_string(), "http://127.0.0.1:1".to_string())
                .unwrap();
        ComplexityRouter::new(client, policy, "gpt-4o-mini".to_string())
    }

    #[test]
    fn think_hard_matching_is_case_insensitive() {
        assert!(contains_think_hard("please THINK HARD about this"));
        assert!(contains_think_hard("Deep Think about quantum gravity"));
        assert!(contains_think_hard("I want you deeply thinking here"));
        assert!(!contains_think_hard("just a simple question"));
        assert!(!contains_think_hard("thinking about lunch"));
    }

    #[tokio::test]
    async fn binary_think_hard_selects_deepest_without_network() {
        let router = router(RoutingPolicy::Binary);
        let selection = router
            .classify("Deep Think about quantum gravity")
            .await
            .unwrap();
        assert_eq!(selection.tier, ModelTier::DeepReasoning);
        assert!(selection.deep_reasoning);
    }

    #[tokio::test]
    async fn binary_fails_open_to_simple_on_transport_error() {
        let router = router(RoutingPolicy::Binary);
        let selection = router.classify("What's 2+2?").await.unwrap();
        assert_eq!(selection.tier, ModelTier::Simple);
        assert!(!selection.deep_reasoning);
    }

    #[tokio::test]
    async fn tiered_propagates_transport_error() {
        let router = router(RoutingPolicy::Tiered);
        let result = router.classify("What's 2+2?").await;
        assert!(result.is_err());
    }

    #[test]
    fn binary_labels() {
        assert_eq!(parse_binary_label(" Simple "), Some(ModelTier::Simple));
        assert_eq!(parse_binary_label("COMPLEX"), Some(ModelTier::Complex));
        assert_eq!(parse_binary_label("medium"), None);
        assert_eq!(parse_binary_label(""), None);
    }

    #[test]
    fn tier_labels_strict() {
        assert_eq!(parse_tier_label("gpt-4o-mini").unwrap(), ModelTier::Simple);
        assert_eq!(parse_tier_label(" GPT-4o ").unwrap(), ModelTier::Complex);
        assert_eq!(parse_tier_label("o1-mini").unwrap(), ModelTier::Reasoning);
        assert_eq!(
            parse_tier_label("o1-preview").unwrap(),
            ModelTier::DeepReasoning
        );
        assert!(matches!(
            parse_tier_label("gpt-5"),
            Err(Error::Classification(_))
        ));
    }

    #[test]
    fn tier_budgets_are_fixed() {
        assert_eq!(ModelTier::Simple.max_tokens(), 1_000);
        assert_eq!(ModelTier::Complex.max_tokens(), 1_500);
        assert_eq!(ModelTier::Reasoning.max_tokens(), 15_000);
        assert_eq!(ModelTier::DeepReasoning.max_tokens(), 15_000);
    }

    #[test]
    fn reasoning_models_reject_system_role() {
        assert!(!ModelTier::Simple.is_reasoning_model());
        assert!(!ModelTier::Complex.is_reasoning_model());
        assert!(ModelTier::Reasoning.is_reasoning_model());
        assert!(ModelTier::DeepReasoning.is_reasoning_model());
    }
}
