//! Enrichment pipeline — summary, intent classification, screenshot text
//!
//! Every function here is soft-failing by contract: a Gemini outage, a
//! malformed response, or a missing API key degrades the enrichment to a
//! fixed fallback value and the capture still commits. Nothing in this
//! module returns an error to its caller.

use resurf_core::embeddings::{EmbeddingBackend, EmbeddingConfig, SoftEmbeddingClient};
use resurf_core::generation::{GeminiGenerationClient, GenerationConfig};
use resurf_core::text::truncate_chars;
use resurf_core::{Intent, ResurfConfig};
use serde::{Deserialize, Serialize};

/// Combined classifier input shorter than this skips the API entirely
pub const MIN_CLASSIFY_CHARS: usize = 20;

/// Classifier content cap, bounds latency and cost
pub const MAX_CLASSIFY_CONTENT_CHARS: usize = 2500;

/// Summarizer input shorter than this skips the API entirely
pub const MIN_SUMMARY_CHARS: usize = 30;

/// Summarizer input cap
pub const MAX_SUMMARY_INPUT_CHARS: usize = 3000;

pub const NO_SUMMARY: &str = "No summary available.";
pub const SUMMARY_UNAVAILABLE: &str = "AI service temporarily unavailable.";
pub const FALLBACK_ACTION: &str = "Review this save manually.";
pub const FALLBACK_CONFIDENCE: f64 = 0.4;

/// The AI clients a capture request needs, built once at startup.
///
/// Both are `None` when no API key is configured — the pipeline then runs
/// entirely on fallbacks, which keeps capture working in dev environments.
pub struct AiClients {
    pub generation: Option<GeminiGenerationClient>,
    pub embedder: Option<SoftEmbeddingClient>,
}

impl AiClients {
    pub fn from_config(config: &ResurfConfig) -> Self {
        let api_key = std::env::var("GOOGLE_API_KEY").unwrap_or_default();

        let generation = GeminiGenerationClient::new(GenerationConfig {
            api_key: api_key.clone(),
            model: config.ai.generation_model.clone(),
            vision_model: config.ai.vision_model.clone(),
        })
        .map_err(|e| tracing::warn!(error = %e, "Generation client unavailable — captures will use fallback enrichment"))
        .ok();

        let embedder = SoftEmbeddingClient::new(EmbeddingConfig {
            api_key,
            model: config.ai.embedding_model.clone(),
            dimensions: config.ai.embedding_dimensions as usize,
            max_retries: config.ai.max_retries as usize,
            retry_delay_ms: config.ai.retry_delay_ms,
        })
        .map_err(|e| tracing::warn!(error = %e, "Embedding client unavailable — saves will be stored without vectors"))
        .ok();

        Self {
            generation,
            embedder,
        }
    }

    /// Embed document text, degrading to `None` on any failure.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match &self.embedder {
            Some(e) => e.embed(text).await.unwrap_or(None),
            None => None,
        }
    }

    /// Embed a search query, degrading to `None` on any failure.
    pub async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        match &self.embedder {
            Some(e) => e.embed_query(text).await.unwrap_or(None),
            None => None,
        }
    }
}

// ============================================================================
// Intent classification
// ============================================================================

/// A well-formed classification. `intent` is always a member of the fixed
/// enumeration; `confidence` and `suggested_action` are passed through from
/// the model unvalidated.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f64,
    pub suggested_action: String,
}

impl IntentResult {
    /// The fixed degraded result: short input, call failure, or malformed output.
    pub fn fallback() -> Self {
        Self {
            intent: Intent::Other,
            confidence: FALLBACK_CONFIDENCE,
            suggested_action: FALLBACK_ACTION.to_string(),
        }
    }
}

/// Raw classifier output before validation.
#[derive(Debug, Deserialize)]
struct RawIntentResult {
    intent: String,
    confidence: f64,
    suggested_action: String,
}

/// Outcome of decoding the model's raw text. Malformed output carries the
/// raw text for logging only — it never propagates upward.
#[derive(Debug)]
pub enum ClassifierOutput {
    Ok(IntentResult),
    Malformed(String),
}

/// Strip a Markdown code-fence wrapper if present (` ```json ... ``` `).
fn strip_code_fences(raw: &str) -> &str {
    match raw.split("```").nth(1) {
        Some(inner) => inner.strip_prefix("json").unwrap_or(inner).trim(),
        None => raw.trim(),
    }
}

/// Decode the model's raw text into a validated result. An intent label
/// outside the enumeration is coerced to `other`; anything unparseable is
/// tagged `Malformed`.
pub fn parse_classifier_output(raw: &str) -> ClassifierOutput {
    let body = strip_code_fences(raw);

    match serde_json::from_str::<RawIntentResult>(body) {
        Ok(parsed) => ClassifierOutput::Ok(IntentResult {
            intent: Intent::parse_or_other(&parsed.intent),
            confidence: parsed.confidence,
            suggested_action: parsed.suggested_action,
        }),
        Err(_) => ClassifierOutput::Malformed(raw.to_string()),
    }
}

fn classify_prompt(combined: &str) -> String {
    format!(
        r#"You are an AI that infers USER INTENT behind saved content.

Your job:
Determine WHY the user saved this.
Infer motivation, not just topic.

Valid intents:
- learning (courses, research, tutorials, knowledge)
- career (jobs, internships, resumes, networking)
- startup (business ideas, funding, entrepreneurship)
- shopping (products, Amazon links, wishlists)
- entertainment (memes, videos, social browsing)
- self-improvement (fitness, mindset, productivity)
- other (ONLY if absolutely unclear)

IMPORTANT:
- Do NOT default to "other" unless truly ambiguous.
- If it's a product page -> shopping
- If it's research or GitHub -> learning
- If it's job/career related -> career
- If it's YouTube educational -> learning
- If it's purely fun scrolling -> entertainment

Return ONLY raw JSON:
{{"intent": "<valid>", "confidence": <0-1>, "suggested_action": "<short next step>"}}

Content:
{combined}"#
    )
}

/// Classify why the user saved this content. Never errors: short input,
/// call failure, and malformed output all return the fixed fallback.
pub async fn classify_intent(
    client: Option<&GeminiGenerationClient>,
    title: &str,
    url: &str,
    content: &str,
) -> IntentResult {
    let combined = format!(
        "Title: {}\nURL: {}\nContent: {}",
        title,
        url,
        truncate_chars(content, MAX_CLASSIFY_CONTENT_CHARS)
    );

    // "Title: \nURL: \nContent: " alone is below the threshold; only real
    // content pushes the combined text over it.
    let meaningful: usize = [title, url, truncate_chars(content, MAX_CLASSIFY_CONTENT_CHARS)]
        .iter()
        .map(|s| s.trim().chars().count())
        .sum();
    if meaningful < MIN_CLASSIFY_CHARS {
        return IntentResult::fallback();
    }

    let client = match client {
        Some(c) => c,
        None => return IntentResult::fallback(),
    };

    let raw = match client.generate_text(&classify_prompt(&combined)).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Intent classification failed — using fallback");
            return IntentResult::fallback();
        }
    };

    match parse_classifier_output(&raw) {
        ClassifierOutput::Ok(result) => result,
        ClassifierOutput::Malformed(raw) => {
            tracing::warn!(raw = %raw, "Classifier returned malformed output — using fallback");
            IntentResult::fallback()
        }
    }
}

// ============================================================================
// Summarization
// ============================================================================

/// Produce a 2-3 sentence synopsis. Never errors: short input returns the
/// fixed "no summary" string, failures return the unavailable string.
pub async fn summarize(client: Option<&GeminiGenerationClient>, text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_SUMMARY_CHARS {
        return NO_SUMMARY.to_string();
    }

    let client = match client {
        Some(c) => c,
        None => return SUMMARY_UNAVAILABLE.to_string(),
    };

    let prompt = format!(
        "Summarize the following content in 2-3 clear sentences.\nBe concise. No preamble.\n\nContent:\n{}\n\nSummary:",
        truncate_chars(trimmed, MAX_SUMMARY_INPUT_CHARS)
    );

    match client.generate_text(&prompt).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(error = %e, "Summary generation failed — using fallback");
            SUMMARY_UNAVAILABLE.to_string()
        }
    }
}

// ============================================================================
// Screenshot extraction
// ============================================================================

const SCREENSHOT_PROMPT: &str = "You are analyzing a screenshot the user saved.\n\
Extract and describe:\n\
1. What this page/content is about\n\
2. Key information visible\n\
3. Why someone might have saved this\n\n\
Be concise, 3-4 sentences max.";

/// Turn a screenshot into descriptive text via the vision model.
/// Returns `None` on any failure; the caller substitutes the title.
pub async fn extract_screenshot_text(
    client: Option<&GeminiGenerationClient>,
    image_bytes: &[u8],
) -> Option<String> {
    let client = client?;

    match client
        .describe_image(SCREENSHOT_PROMPT, image_bytes, "image/png")
        .await
    {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(error = %e, "Screenshot extraction failed — caller will fall back to the title");
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
