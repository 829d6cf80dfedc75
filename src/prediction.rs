use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::block::Document;

/// Label used for the synthetic result of a failed request.
pub const ERROR_LABEL: &str = "Error";

/// Explanation shown when the inference service could not be reached.
pub const FAILURE_EXPLANATION: &str =
    "Failed to analyze the image. Please try again or check your connection.";

/// Response body of the inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: String,
    #[serde(default, deserialize_with = "explanation_text")]
    pub explanation: Option<String>,
}

/// Coarse health reading of a prediction label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Healthy,
    Diseased,
    Error,
}

impl Prediction {
    /// The stand-in result for any transport, status or decoding failure.
    pub fn failed() -> Self {
        Self {
            prediction: ERROR_LABEL.to_string(),
            explanation: Some(FAILURE_EXPLANATION.to_string()),
        }
    }

    pub fn verdict(&self) -> Verdict {
        let label = self.prediction.to_lowercase();
        if label.contains("healthy") || label.contains("normal") {
            Verdict::Healthy
        } else if self.prediction == ERROR_LABEL {
            Verdict::Error
        } else {
            Verdict::Diseased
        }
    }

    /// Render the explanation; an absent explanation yields an empty document.
    pub fn document(&self) -> Document {
        crate::render(self.explanation.as_deref())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Healthy => "healthy",
            Verdict::Diseased => "diseased",
            Verdict::Error => "error",
        })
    }
}

// The service falls back to echoing the upstream payload when it cannot find
// the explanation text, so accept any JSON value and keep non-strings as JSON.
fn explanation_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, Span};

    fn prediction(label: &str) -> Prediction {
        Prediction {
            prediction: label.to_string(),
            explanation: None,
        }
    }

    #[test]
    fn verdicts() {
        assert_eq!(prediction("Healthy").verdict(), Verdict::Healthy);
        assert_eq!(prediction("normal_leaf").verdict(), Verdict::Healthy);
        assert_eq!(prediction("Bacterial Canker").verdict(), Verdict::Diseased);
        assert_eq!(prediction("Error").verdict(), Verdict::Error);
        assert_eq!(prediction("error").verdict(), Verdict::Diseased);
        assert_eq!(Prediction::failed().verdict(), Verdict::Error);
    }

    #[test]
    fn decodes_string_explanation() {
        let parsed: Prediction =
            serde_json::from_str(r##"{"prediction":"Leaf Spot","explanation":"# Leaf Spot"}"##)
                .unwrap();
        assert_eq!(parsed.prediction, "Leaf Spot");
        assert_eq!(parsed.explanation.as_deref(), Some("# Leaf Spot"));
    }

    #[test]
    fn missing_or_null_explanation() {
        let missing: Prediction = serde_json::from_str(r#"{"prediction":"Healthy"}"#).unwrap();
        assert_eq!(missing.explanation, None);
        assert!(missing.document().is_empty());

        let null: Prediction =
            serde_json::from_str(r#"{"prediction":"Healthy","explanation":null}"#).unwrap();
        assert_eq!(null.explanation, None);
    }

    #[test]
    fn object_explanation_is_kept_as_json_text() {
        let parsed: Prediction = serde_json::from_str(
            r#"{"prediction":"Healthy","explanation":{"message":"quota exceeded"}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.explanation.as_deref(),
            Some(r#"{"message":"quota exceeded"}"#)
        );
    }

    #[test]
    fn failure_explanation_renders_as_plain_paragraph() {
        assert_eq!(
            Prediction::failed().document().blocks(),
            &[Block::Paragraph {
                content: vec![Span::Plain(FAILURE_EXPLANATION.to_string())]
            }]
        );
    }
}
