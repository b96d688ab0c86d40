use color_eyre::{Result, eyre};
use serde_json::Value;

/// One chat-completion call whose reply must be JSON. There is no retry here; callers bound the
/// whole call with their own deadline and fall back on any error.
pub async fn complete_json(
	cfg: &tadka_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<Value> {
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_output_tokens,
		"messages": messages,
	});
	let res = crate::client(cfg.timeout_ms)?
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(&json)
}

fn parse_completion(json: &Value) -> Result<Value> {
	let content = json
		.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.ok_or_else(|| eyre::eyre!("Refiner response is missing message content."))?;

	serde_json::from_str(strip_code_fence(content))
		.map_err(|err| eyre::eyre!("Refiner content is not valid JSON: {err}."))
}

/// Removes a surrounding Markdown code fence, with or without a `json` language tag.
pub fn strip_code_fence(content: &str) -> &str {
	let mut body = content.trim();

	if let Some(rest) = body.strip_prefix("```") {
		body = rest.strip_prefix("json").unwrap_or(rest);
	}
	if let Some(rest) = body.strip_suffix("```") {
		body = rest;
	}

	body.trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fenced_json_is_unwrapped() {
		assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
		assert_eq!(strip_code_fence("```\n{}\n```  "), "{}");
		assert_eq!(strip_code_fence("[]"), "[]");
	}

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n[{\"recipe_id\": \"a\", \"explanation\": \"b\"}]\n```" } }
			]
		});
		let parsed = parse_completion(&json).expect("Failed to parse completion.");

		assert_eq!(parsed[0]["recipe_id"], "a");
	}

	#[test]
	fn prose_reply_is_an_error() {
		let json = serde_json::json!({
			"choices": [{ "message": { "content": "Here are my picks!" } }]
		});

		assert!(parse_completion(&json).is_err());
	}
}
