use color_eyre::{Result, eyre};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	index: Option<usize>,
	embedding: Vec<f32>,
}

/// Embeds `texts` with an OpenAI-compatible `/embeddings` endpoint. Output order follows input
/// order, and every vector is checked against the configured dimension.
pub async fn embed(
	cfg: &tadka_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = crate::client(cfg.timeout_ms)?
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let raw = res.error_for_status()?.text().await?;

	parse_embedding_response(&raw, texts.len(), cfg.dimensions as usize)
}

fn parse_embedding_response(
	raw: &str,
	expected: usize,
	dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
	let response: EmbeddingResponse = serde_json::from_str(raw)
		.map_err(|err| eyre::eyre!("Embedding response is not in the expected shape: {err}."))?;

	if response.data.len() != expected {
		return Err(eyre::eyre!(
			"Embedding response has {} vectors for {expected} inputs.",
			response.data.len()
		));
	}

	let mut indexed: Vec<(usize, Vec<f32>)> = response
		.data
		.into_iter()
		.enumerate()
		.map(|(position, item)| (item.index.unwrap_or(position), item.embedding))
		.collect();

	indexed.sort_by_key(|(index, _)| *index);

	if let Some((index, vector)) = indexed.iter().find(|(_, vector)| vector.len() != dimensions) {
		return Err(eyre::eyre!(
			"Embedding {index} has dimension {}, expected {dimensions}.",
			vector.len()
		));
	}

	Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}
