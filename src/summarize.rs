use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, warn};

use crate::{ScriptError, ShortsScript, Style};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// One prompt sent to a chat model on behalf of a caller
#[derive(Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub api_key: &'a str,
}

/// Text-completion backend
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;
}

/// Model parameters fixed at startup
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    /// Extra prompts asking the model to fix a reply that is not valid JSON
    pub repair_attempts: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            repair_attempts: 0,
        }
    }
}

/// Turn a transcript into a shorts script in the requested style
pub async fn generate_script(
    model: &dyn ChatModel,
    settings: &ModelSettings,
    transcript_text: &str,
    api_key: &str,
    style: Style,
) -> Result<ShortsScript, ScriptError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ScriptError::InvalidInput("an LLM API key is required".to_string()));
    }

    let base_prompt = build_prompt(transcript_text, style);
    let mut prompt = base_prompt.clone();
    let mut repairs = 0;

    loop {
        debug!("Generating {style} script via {} (repair {repairs})", settings.model);

        let reply = model
            .complete(CompletionRequest {
                model: &settings.model,
                prompt: &prompt,
                temperature: settings.temperature,
                api_key,
            })
            .await
            .map_err(|e| ScriptError::Generation(format!("{e:#}")))?;

        match parse_script(&reply) {
            Ok(script) => return Ok(script),
            Err(err) if repairs < settings.repair_attempts => {
                repairs += 1;
                warn!("Model reply was not a valid script ({err}); re-prompting {repairs}/{}", settings.repair_attempts);
                prompt = build_repair_prompt(&base_prompt, &reply);
            }
            Err(err) => return Err(err),
        }
    }
}

pub fn build_prompt(transcript_text: &str, style: Style) -> String {
    let tones = Style::ALL
        .iter()
        .map(|s| format!("     - {}: {}", capitalize(s.name()), s.tone()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert scriptwriter for short-form video content. Create a YouTube Shorts script from the provided YouTube video transcript. The script must include a catchy title, engaging subtitles, narration, and visual suggestions, tailored to a specific style.

**Input:**
- Transcript: {transcript_text}
- Desired Style: {name} ({label})
- Duration: 1 minute

**Instructions:**

1. **Summary Requirements:**
   - Extract only the core message and key information from the transcript.
   - Maintain logical flow and coherence.
   - Avoid omitting critical information.

2. **Style Requirements:**
   - Adapt the tone and language to match the specified style ({name}).
   - Style guide:
{tones}

3. **Output Format:**
   - **Title**: A short, attention-grabbing title (5-10 words) that hooks the audience.
   - **Subtitles**: Concise, engaging text for on-screen display.
   - **Narration**: A voice-over script that matches the style and complements the subtitles.
   - **Visual Suggestions**: Brief descriptions of visuals or effects to enhance the narrative.

4. **Language**: Write the title, subtitles, and narration in Korean. Write the visual suggestions in English.

**Output:**
Respond with a JSON object with exactly this structure:
{{
  "title": "한국어로 된 후킹 제목",
  "subtitles": "간결하고 매력적인 자막 텍스트",
  "narration": "내레이션 스크립트",
  "visual_suggestions": "Visual descriptions"
}}

Important: Respond ONLY with valid JSON. Do not include any text before or after the JSON."#,
        name = style.name(),
        label = style.label(),
    )
}

fn build_repair_prompt(base_prompt: &str, bad_reply: &str) -> String {
    format!(
        "{base_prompt}\n\nYour previous reply could not be parsed:\n{bad_reply}\n\n\
         Reply again with ONLY the JSON object containing the keys \
         \"title\", \"subtitles\", \"narration\" and \"visual_suggestions\"."
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Remove an enclosing ``` fence (with optional `json` tag) from a model reply
pub fn strip_code_fence(content: &str) -> &str {
    let content = content.trim();
    if !content.starts_with("```") {
        return content;
    }
    let inner = content.split("```").nth(1).unwrap_or_default();
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

/// Parse a model reply into a script; all four fields must be present
pub fn parse_script(reply: &str) -> Result<ShortsScript, ScriptError> {
    let content = strip_code_fence(reply);
    serde_json::from_str(content).map_err(|e| ScriptError::MalformedResponse {
        reason: e.to_string(),
        content: content.to_string(),
    })
}

/// Chat model speaking the OpenAI and Anthropic HTTP APIs
#[derive(Debug, Clone)]
pub struct HttpChatModel {
    client: reqwest::Client,
    openai_base_url: String,
    anthropic_base_url: String,
}

impl HttpChatModel {
    pub fn new(client: reqwest::Client, openai_base_url: &str, anthropic_base_url: &str) -> Self {
        Self {
            client,
            openai_base_url: openai_base_url.trim_end_matches('/').to_string(),
            anthropic_base_url: anthropic_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn complete_anthropic(&self, request: CompletionRequest<'_>) -> Result<String> {
        debug!("Calling Anthropic API with model {}", request.model);

        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": 4096,
            "temperature": request.temperature,
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/messages", self.anthropic_base_url))
            .header("x-api-key", request.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Anthropic API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_anthropic_text(&json)
    }

    async fn complete_openai(&self, request: CompletionRequest<'_>) -> Result<String> {
        debug!("Calling OpenAI API with model {}", request.model);

        let body = serde_json::json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.openai_base_url))
            .bearer_auth(request.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("OpenAI API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_openai_text(&json)
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        if is_anthropic_model(request.model) {
            self.complete_anthropic(request).await
        } else {
            self.complete_openai(request).await
        }
    }
}

fn is_anthropic_model(model: &str) -> bool {
    model.starts_with("claude")
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    let text = json
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        bail!("unexpected Anthropic API response format");
    }
    Ok(text)
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    match json.pointer("/choices/0/message/content").and_then(|t| t.as_str()) {
        Some(text) => Ok(text.to_string()),
        None => bail!("unexpected OpenAI API response format"),
    }
}
