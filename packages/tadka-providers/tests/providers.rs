use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use tadka_config::LlmProviderConfig;

fn refiner_config(api_base: &str) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test".to_string(),
		api_base: api_base.to_string(),
		api_key: "key".to_string(),
		path: "/v1/chat/completions".to_string(),
		model: "m".to_string(),
		temperature: 0.3,
		max_output_tokens: 256,
		timeout_ms: 500,
		default_headers: Map::new(),
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers =
		tadka_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn default_headers_must_be_strings() {
	let mut extra = Map::new();

	extra.insert("x-team".to_string(), Value::from(7));

	assert!(tadka_providers::auth_headers("secret", &extra).is_err());

	extra.insert("x-team".to_string(), Value::from("kitchen"));

	let headers = tadka_providers::auth_headers("secret", &extra).expect("Failed to build headers.");

	assert_eq!(headers.get("x-team").expect("Missing extra header."), "kitchen");
}

#[tokio::test]
async fn unreachable_refiner_fails_fast() {
	let cfg = refiner_config("http://127.0.0.1:9");
	let result = tadka_providers::refiner::complete_json(&cfg, &[]).await;

	assert!(result.is_err());
}
