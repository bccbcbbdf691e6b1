//! Assistant reply parsing
//!
//! Models reply in one of two shapes: a structured JSON object carrying
//! step-by-step working plus a final resolution, or plain freeform text.
//! The shape is resolved once at parse time; downstream stages only see the
//! speakable string.

use serde::Deserialize;

/// Spoken when a reply yields no usable speakable text
pub const FALLBACK_APOLOGY: &str = "I'm sorry, I didn't understand that.";

/// One working step in a structured reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    /// What the step covers
    pub description: String,
    /// What was done in the step
    pub action: String,
}

/// Structured reply schema
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructuredReply {
    /// Ordered working steps (may be empty)
    pub steps: Vec<Step>,
    /// The answer to speak
    pub final_resolution: String,
    /// Optional song suggestion
    #[serde(default)]
    pub song_title: Option<String>,
    /// Optional model confidence, 0.0 to 1.0
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// A reply from the assistant, structured or freeform
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    /// Decoded from the structured JSON schema
    Structured(StructuredReply),
    /// Raw text (anything that is not valid structured JSON)
    Freeform(String),
}

impl AssistantReply {
    /// Parse raw reply text.
    ///
    /// Attempts a strict decode of the structured schema; anything that
    /// fails to decode is treated as freeform text verbatim. This never
    /// fails: a malformed structured reply degrades to speaking the raw
    /// text rather than aborting the turn.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<StructuredReply>(raw) {
            Ok(reply) => {
                tracing::debug!(steps = reply.steps.len(), "structured reply parsed");
                Self::Structured(reply)
            }
            Err(e) => {
                tracing::debug!(error = %e, "reply is not structured JSON, using raw text");
                Self::Freeform(raw.to_string())
            }
        }
    }

    /// The single string handed to speech synthesis
    #[must_use]
    pub fn speakable(&self) -> &str {
        match self {
            Self::Structured(reply) => &reply.final_resolution,
            Self::Freeform(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reply_speaks_final_resolution() {
        let raw = r#"{"steps":[],"final_resolution":"Yes!","confidence":0.9}"#;
        let reply = AssistantReply::parse(raw);
        assert_eq!(reply.speakable(), "Yes!");
        match reply {
            AssistantReply::Structured(r) => {
                assert!(r.steps.is_empty());
                assert_eq!(r.confidence, Some(0.9));
                assert_eq!(r.song_title, None);
            }
            AssistantReply::Freeform(_) => panic!("expected structured reply"),
        }
    }

    #[test]
    fn structured_reply_with_steps() {
        let raw = r#"{
            "steps": [
                {"description": "Understanding the request", "action": "Identify key components"},
                {"description": "Formulating response", "action": "Drafting answer"}
            ],
            "final_resolution": "All set.",
            "song_title": "Imagine Dragons - Believer",
            "confidence": 0.95
        }"#;
        let reply = AssistantReply::parse(raw);
        assert_eq!(reply.speakable(), "All set.");
        match reply {
            AssistantReply::Structured(r) => assert_eq!(r.steps.len(), 2),
            AssistantReply::Freeform(_) => panic!("expected structured reply"),
        }
    }

    #[test]
    fn plain_text_falls_back_to_freeform() {
        let raw = "The answer is four.";
        let reply = AssistantReply::parse(raw);
        assert_eq!(reply, AssistantReply::Freeform(raw.to_string()));
        assert_eq!(reply.speakable(), raw);
    }

    #[test]
    fn malformed_json_is_freeform_verbatim() {
        let raw = r#"{"steps": [, "final_resolution": oops}"#;
        let reply = AssistantReply::parse(raw);
        assert_eq!(reply.speakable(), raw);
    }

    #[test]
    fn json_missing_required_field_is_freeform() {
        // Valid JSON but not the structured schema
        let raw = r#"{"answer": "Yes"}"#;
        let reply = AssistantReply::parse(raw);
        assert_eq!(reply.speakable(), raw);
    }
}
