//! LLM dispatch
//!
//! Two strategies behind one call: a stateless chat-completion round trip,
//! or a stateful assistant thread (create, post, run, poll, fetch) when an
//! assistant id is configured for the selected tier.

pub mod assistant;
pub mod completion;

pub use assistant::{AssistantClient, RunStatus, parse_run_status};
pub use completion::{CompletionClient, CompletionRequest};

use crate::router::{ModelSelection, ModelTier};
use crate::Result;

/// Assistant ids for tiers dispatched through the threads API
#[derive(Debug, Clone, Default)]
pub struct AssistantIds {
    /// Assistant for the simple tier
    pub simple: Option<String>,
    /// Assistant for the complex tier
    pub complex: Option<String>,
}

impl AssistantIds {
    /// The configured assistant for a tier, if any. Reasoning tiers always
    /// dispatch through stateless completion.
    #[must_use]
    pub fn for_tier(&self, tier: ModelTier) -> Option<&str> {
        match tier {
            ModelTier::Simple => self.simple.as_deref(),
            ModelTier::Complex => self.complex.as_deref(),
            ModelTier::Reasoning | ModelTier::DeepReasoning => None,
        }
    }
}

/// Generates the raw reply for a turn
pub struct ResponseGenerator {
    completion: CompletionClient,
    assistant: AssistantClient,
    assistant_ids: AssistantIds,
    persona: String,
}

impl ResponseGenerator {
    /// Create a new response generator.
    ///
    /// `persona` is the fixed assistant instruction — configuration passed
    /// in, never computed here.
    #[must_use]
    pub fn new(
        completion: CompletionClient,
        assistant: AssistantClient,
        assistant_ids: AssistantIds,
        persona: String,
    ) -> Self {
        Self {
            completion,
            assistant,
            assistant_ids,
            persona,
        }
    }

    /// Dispatch user text to the selected model and return raw reply text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` on any vendor or transport failure, and
    /// `Error::GenerationTimeout` if an assistant run never settles.
    pub async fn generate(&self, text: &str, selection: ModelSelection) -> Result<String> {
        let tier = selection.tier;

        if let Some(assistant_id) = self.assistant_ids.for_tier(tier) {
            tracing::info!(tier = ?tier, assistant = assistant_id, "dispatching to assistant thread");
            return self.assistant.run(assistant_id, text).await;
        }

        tracing::info!(tier = ?tier, model = tier.wire_id(), "dispatching to chat completion");

        // Reasoning models reject the system role; fold the persona into
        // the user message instead.
        let folded;
        let (system, user) = if tier.is_reasoning_model() {
            folded = format!("{}\n\nUser: {text}", self.persona);
            (None, folded.as_str())
        } else {
            (Some(self.persona.as_str()), text)
        };

        let request = CompletionRequest {
            model: tier.wire_id(),
            system,
            user,
            max_tokens: tier.max_tokens(),
            temperature: None,
        };

        self.completion.complete(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_ids_only_cover_completion_tiers() {
        let ids = AssistantIds {
            simple: Some("asst_simple".to_string()),
            complex: Some("asst_complex".to_string()),
        };

        assert_eq!(ids.for_tier(ModelTier::Simple), Some("asst_simple"));
        assert_eq!(ids.for_tier(ModelTier::Complex), Some("asst_complex"));
        assert_eq!(ids.for_tier(ModelTier::Reasoning), None);
        assert_eq!(ids.for_tier(ModelTier::DeepReasoning), None);
    }

    #[test]
    fn default_assistant_ids_are_empty() {
        let ids = AssistantIds::default();
        assert_eq!(ids.for_tier(ModelTier::Simple), None);
        assert_eq!(ids.for_tier(ModelTier::Complex), None);
    }
}
