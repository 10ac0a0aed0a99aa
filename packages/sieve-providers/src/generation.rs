use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

pub async fn generate(
	client: &Client,
	cfg: &sieve_config::LlmProviderConfig,
	prompt: &str,
	max_tokens: u32,
	temperature: f32,
) -> Result<String> {
	let body = serde_json::json!({
		"model": cfg.model,
		"max_tokens": max_tokens,
		"temperature": temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.timeout(crate::timeout(cfg.timeout_ms))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_generation_text(&json)
}

/// Accepts chat-completion (`choices[].message.content`) and messages (`content[].text`)
/// response shapes.
fn parse_generation_text(json: &Value) -> Result<String> {
	let chat = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str());
	let messages = || {
		json.get("content")
			.and_then(|v| v.as_array())
			.and_then(|arr| arr.iter().find_map(|block| block.get("text")))
			.and_then(|t| t.as_str())
	};

	chat.or_else(messages)
		.map(|text| text.trim().to_string())
		.ok_or_else(|| eyre::eyre!("Generation response is missing text content."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_chat_completion_content() {
		let json = serde_json::json!({
			"choices": [{ "message": { "role": "assistant", "content": "  Net profit rose.\n" } }]
		});

		assert_eq!(parse_generation_text(&json).expect("parse failed"), "Net profit rose.");
	}

	#[test]
	fn parses_message_content_blocks() {
		let json = serde_json::json!({
			"content": [{ "type": "text", "text": "NO_RELEVANT_INFO" }]
		});

		assert_eq!(parse_generation_text(&json).expect("parse failed"), "NO_RELEVANT_INFO");
	}

	#[test]
	fn missing_content_is_an_error() {
		let json = serde_json::json!({ "choices": [] });

		assert!(parse_generation_text(&json).is_err());
	}
}
