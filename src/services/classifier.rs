use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::verdict::Verdict;

/// Evaluation window: only the first 3000 characters of extracted text reach
/// the model.
const PROMPT_TEXT_LIMIT: usize = 3000;

/// Model inference is slow; allow well beyond the document-fetch timeout.
const INFERENCE_TIMEOUT: Duration = Duration::from_secs(120);

/// How a resume text is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Lightweight valid/invalid screening.
    Binary,
    /// Full evaluation including a 0-10 quality score.
    Scored,
}

/// Client for the local inference endpoint (Ollama generate API).
///
/// Stateless per invocation; one request, one parsed verdict.
pub struct ClassifierClient {
    http: Client,
    generate_url: String,
    screening_model: String,
    scoring_model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    /// The generated text; expected to be a JSON-encoded verdict.
    response: String,
}

/// Verdict exactly as the model emits it; required keys are enforced per mode
/// in [`parse_verdict`].
#[derive(Deserialize)]
struct RawVerdict {
    valid: Option<bool>,
    score: Option<i32>,
    confidence: Option<f64>,
    reason: Option<String>,
}

const SCORED_INSTRUCTIONS: &str = r#"You are an expert HR AI Resume Validator. Your task is to evaluate the provided resume text.

Rules:
1. A Resume/CV MUST contain: Contact Information, Education, and Skills/Experience.
2. Reject random text, code snippets, or unrelated documents.
3. If it is a Resume, output rigid JSON:
   { "valid": true, "score": 8, "confidence": 0.95, "reason": "Good structure, but lacks specific impact metrics." }
4. "score" should be an integer from 0 to 10 based on quality, completeness, and professionalism.
5. If NOT a Resume, output rigid JSON:
   { "valid": false, "score": 0, "confidence": 0.9, "reason": "Text appears to be random." }
6. Do NOT output markdown. Output ONLY JSON."#;

const BINARY_INSTRUCTIONS: &str = r#"You are an expert HR AI Resume Validator. Your task is to classify whether the provided text data belongs to a valid professional Resume/CV or not.

Rules:
1. A Resume/CV MUST contain: Contact Information (Email/Phone), Education History, and Skills or Experience.
2. Reject random text, code snippets, essays, generic articles, or unrelated documents.
3. If it is a Resume, output rigid JSON: { "valid": true, "confidence": 0.95, "reason": "Contains clear education and skills sections." }
4. If NOT a Resume, output rigid JSON: { "valid": false, "confidence": 0.9, "reason": "Text appears to be a random essay/article." }
5. Do NOT output markdown. Output ONLY JSON."#;

impl ClassifierClient {
    pub fn new(
        inference_url: &str,
        screening_model: &str,
        scoring_model: &str,
    ) -> Result<Self, ClassifierError> {
        let http = Client::builder()
            .timeout(INFERENCE_TIMEOUT)
            .build()
            .map_err(ClassifierError::Http)?;
        Ok(Self {
            http,
            generate_url: format!("{}/api/generate", inference_url.trim_end_matches('/')),
            screening_model: screening_model.to_string(),
            scoring_model: scoring_model.to_string(),
        })
    }

    /// Ask the model whether `text` is a valid resume.
    pub async fn classify(&self, text: &str, mode: EvalMode) -> Result<Verdict, ClassifierError> {
        let prompt = build_prompt(text, mode);
        let model = match mode {
            EvalMode::Binary => &self.screening_model,
            EvalMode::Scored => &self.scoring_model,
        };
        let request = GenerateRequest {
            model,
            prompt: &prompt,
            stream: false,
            format: "json",
        };

        let response = self
            .http
            .post(&self.generate_url)
            .json(&request)
            .send()
            .await
            .map_err(ClassifierError::Http)?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status().as_u16()));
        }

        let body: GenerateResponse = response.json().await.map_err(ClassifierError::Http)?;
        parse_verdict(&body.response, mode)
    }
}

/// Build the deterministic instruction prompt for the given mode.
pub(crate) fn build_prompt(text: &str, mode: EvalMode) -> String {
    let instructions = match mode {
        EvalMode::Binary => BINARY_INSTRUCTIONS,
        EvalMode::Scored => SCORED_INSTRUCTIONS,
    };
    let window = evaluation_window(text);
    format!("{instructions}\n\nInput Text:\n\"\"\"{window}\"\"\"")
}

fn evaluation_window(text: &str) -> &str {
    match text.char_indices().nth(PROMPT_TEXT_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse the model's raw output into a [`Verdict`].
///
/// Fails rather than returning a partial object: `valid`, `reason` and
/// `confidence` are always required, `score` additionally in scored mode.
/// Values are passed through without range checks.
pub(crate) fn parse_verdict(raw: &str, mode: EvalMode) -> Result<Verdict, ClassifierError> {
    let parsed: RawVerdict = serde_json::from_str(raw).map_err(ClassifierError::Parse)?;

    let valid = parsed.valid.ok_or(ClassifierError::MissingField("valid"))?;
    let reason = parsed.reason.ok_or(ClassifierError::MissingField("reason"))?;
    let confidence = parsed
        .confidence
        .ok_or(ClassifierError::MissingField("confidence"))?;
    let score = match mode {
        EvalMode::Scored => parsed.score.ok_or(ClassifierError::MissingField("score"))?,
        EvalMode::Binary => parsed.score.unwrap_or(0),
    };

    Ok(Verdict {
        valid,
        score,
        confidence,
        reason,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("inference request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference endpoint returned HTTP {0}")]
    Status(u16),

    #[error("model output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model output is missing required key `{0}`")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_truncates_to_evaluation_window() {
        let text = "a".repeat(PROMPT_TEXT_LIMIT) + "OVERFLOW";
        let prompt = build_prompt(&text, EvalMode::Scored);
        assert!(prompt.contains(&"a".repeat(PROMPT_TEXT_LIMIT)));
        assert!(!prompt.contains("OVERFLOW"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(PROMPT_TEXT_LIMIT + 100);
        let prompt = build_prompt(&text, EvalMode::Binary);
        assert!(prompt.contains(&"é".repeat(PROMPT_TEXT_LIMIT)));
        assert!(!prompt.contains(&"é".repeat(PROMPT_TEXT_LIMIT + 1)));
    }

    #[test]
    fn short_text_is_embedded_whole() {
        let prompt = build_prompt("Jane Doe, jane@example.com", EvalMode::Scored);
        assert!(prompt.contains("\"\"\"Jane Doe, jane@example.com\"\"\""));
    }

    #[test]
    fn modes_build_distinct_prompts() {
        let scored = build_prompt("text", EvalMode::Scored);
        let binary = build_prompt("text", EvalMode::Binary);
        assert!(scored.contains("\"score\""));
        assert!(!binary.contains("\"score\""));
        assert!(scored.contains("Output ONLY JSON"));
        assert!(binary.contains("Output ONLY JSON"));
    }

    #[test]
    fn parses_scored_verdict() {
        let verdict = parse_verdict(
            r#"{"valid": true, "score": 8, "confidence": 0.9, "reason": "solid resume"}"#,
            EvalMode::Scored,
        )
        .unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.score, 8);
        assert_eq!(verdict.confidence, 0.9);
        assert_eq!(verdict.reason, "solid resume");
    }

    #[test]
    fn binary_verdict_defaults_missing_score_to_zero() {
        let verdict = parse_verdict(
            r#"{"valid": false, "confidence": 0.8, "reason": "random essay"}"#,
            EvalMode::Binary,
        )
        .unwrap();
        assert_eq!(verdict.score, 0);
    }

    #[test]
    fn scored_verdict_requires_score() {
        let err = parse_verdict(
            r#"{"valid": true, "confidence": 0.8, "reason": "ok"}"#,
            EvalMode::Scored,
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::MissingField("score")));
    }

    #[test]
    fn missing_required_keys_are_errors_not_partial_objects() {
        for raw in [
            r#"{"score": 5, "confidence": 0.8, "reason": "no valid key"}"#,
            r#"{"valid": true, "score": 5, "confidence": 0.8}"#,
            r#"{"valid": true, "score": 5, "reason": "no confidence"}"#,
        ] {
            assert!(parse_verdict(raw, EvalMode::Scored).is_err(), "accepted: {raw}");
        }
    }

    #[test]
    fn non_json_output_is_a_parse_error() {
        let err = parse_verdict("This looks like a resume to me.", EvalMode::Binary).unwrap_err();
        assert!(matches!(err, ClassifierError::Parse(_)));
    }

    #[test]
    fn markdown_fenced_output_is_rejected() {
        let raw = "```json\n{\"valid\": true, \"confidence\": 0.9, \"reason\": \"ok\"}\n```";
        assert!(matches!(
            parse_verdict(raw, EvalMode::Binary).unwrap_err(),
            ClassifierError::Parse(_)
        ));
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let verdict = parse_verdict(
            r#"{"valid": true, "score": 42, "confidence": 7.5, "reason": "enthusiastic model"}"#,
            EvalMode::Scored,
        )
        .unwrap();
        assert_eq!(verdict.score, 42);
        assert_eq!(verdict.confidence, 7.5);
    }
}
