//! Chat-completions recommendation engine.
//!
//! Sends an analyst prompt (news headlines, price, date) to an
//! OpenAI-compatible `/chat/completions` endpoint with a
//! `trade_recommendation` function schema, then reads the function-call
//! arguments, falling back to the message content parsed as JSON.

use super::circuit_breaker::CircuitBreaker;
use super::http::{build_client, send_with_retry, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tradesim_core::{ProviderError, RawRecommendation, RecommendationEngine, RecommendationRequest};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const FUNCTION_NAME: &str = "trade_recommendation";

/// Model call parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: 0.5,
            max_tokens: 150,
            base_url: OPENAI_CHAT_URL.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    #[serde(default)]
    name: String,
    arguments: String,
}

/// Arguments of the `trade_recommendation` function.
#[derive(Debug, Deserialize)]
struct TradeArgs {
    action: String,
    #[serde(default)]
    buy_limit: Option<f64>,
    #[serde(default)]
    sell_limit: Option<f64>,
    #[serde(default)]
    quantity: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    rationale: Option<String>,
}

impl TradeArgs {
    /// The limit that applies to the chosen action becomes the limit price.
    fn into_raw(self) -> RawRecommendation {
        let action = self.action.trim().to_ascii_uppercase();
        let limit_price = match action.as_str() {
            "BUY" => self.buy_limit,
            "SELL" => self.sell_limit,
            _ => None,
        };
        RawRecommendation {
            action: self.action,
            confidence: self.confidence,
            limit_price,
            quantity: self.quantity,
            rationale: self.rationale.unwrap_or_default(),
        }
    }
}

/// Per-request HTTP timeout, inside the engine's default collaborator deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

pub struct ChatCompletionsEngine {
    client: reqwest::blocking::Client,
    api_key: String,
    settings: ChatSettings,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl ChatCompletionsEngine {
    pub fn new(
        api_key: String,
        settings: ChatSettings,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            api_key,
            settings,
            breaker,
            retry: RetryPolicy::none(),
        })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

impl RecommendationEngine for ChatCompletionsEngine {
    fn name(&self) -> &str {
        "chat_completions"
    }

    fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RawRecommendation, ProviderError> {
        let body = request_body(&self.settings, request);
        let what = format!("recommendation for {} on {}", request.symbol, request.date);
        let resp = send_with_retry(&self.breaker, &self.retry, &what, || {
            self.client
                .post(&self.settings.base_url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
        })?;
        let chat: ChatResponse = resp
            .json()
            .map_err(|e| ProviderError::MalformedResponse(format!("{what}: {e}")))?;
        let raw = parse_response(chat)?;
        debug!(
            symbol = %request.symbol,
            date = %request.date,
            action = %raw.action,
            limit = ?raw.limit_price,
            "model recommendation"
        );
        Ok(raw)
    }
}

/// The analyst prompt for one symbol and day.
pub fn build_prompt(request: &RecommendationRequest) -> String {
    let news = if request.articles.is_empty() {
        "No news available.".to_string()
    } else {
        request
            .articles
            .iter()
            .map(|a| a.headline())
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "You are an expert stock analyst. Given the following news and the current price \
         for {symbol} on {date}:\n\nNews:\n{news}\n\nCurrent Price: {price}\n\n\
         Based on this information, provide a trading recommendation optimized for profit.",
        symbol = request.symbol,
        date = request.date,
        price = request.price,
    )
}

/// JSON schema of the structured answer.
pub fn function_schema() -> Value {
    json!({
        "name": FUNCTION_NAME,
        "description": "Return a trading recommendation with the following keys: symbol, buy_limit, sell_limit, and action.",
        "parameters": {
            "type": "object",
            "properties": {
                "symbol": { "type": "string", "description": "The stock symbol." },
                "buy_limit": {
                    "type": "number",
                    "description": "The price below which the stock should be bought."
                },
                "sell_limit": {
                    "type": "number",
                    "description": "The price above which the stock should be sold."
                },
                "action": {
                    "type": "string",
                    "enum": ["BUY", "SELL", "HOLD"],
                    "description": "The recommended action."
                },
                "rationale": {
                    "type": "string",
                    "description": "One sentence explaining the recommendation."
                }
            },
            "required": ["symbol", "buy_limit", "sell_limit", "action"]
        }
    })
}

fn request_body(settings: &ChatSettings, request: &RecommendationRequest) -> Value {
    json!({
        "model": settings.model,
        "messages": [{ "role": "user", "content": build_prompt(request) }],
        "functions": [function_schema()],
        "function_call": "auto",
        "temperature": settings.temperature,
        "max_tokens": settings.max_tokens,
    })
}

fn parse_response(chat: ChatResponse) -> Result<RawRecommendation, ProviderError> {
    let message = chat
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".into()))?;

    let call = message.function_call.or_else(|| {
        message
            .tool_calls
            .into_iter()
            .map(|t| t.function)
            .find(|f| f.name == FUNCTION_NAME)
    });
    let payload = match (call, message.content) {
        (Some(call), _) => call.arguments,
        (None, Some(content)) => strip_code_fence(&content).to_string(),
        (None, None) => {
            return Err(ProviderError::MalformedResponse(
                "response has neither a function call nor content".into(),
            ))
        }
    };
    let args: TradeArgs = serde_json::from_str(&payload)
        .map_err(|e| ProviderError::MalformedResponse(format!("recommendation arguments: {e}")))?;
    Ok(args.into_raw())
}

/// Models sometimes wrap JSON content in a Markdown code fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}
