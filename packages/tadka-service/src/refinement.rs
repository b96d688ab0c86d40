use std::{collections::BTreeSet, sync::Arc, time::Duration};

use serde_json::{Value, json};
use uuid::Uuid;

use tadka_config::LlmProviderConfig;
use tadka_domain::{
	model::{RefinementState, RequestMeta, ScoredCandidate, UserTasteContext, tag_keys},
	ranker,
};

use crate::RefinementProvider;

const SYSTEM_PROMPT: &str = "\
You are a home-cooking assistant choosing recipes for one user. \
Pick the best recipes for the user from the candidates you are given and order them best first. \
Only use recipe ids from the candidate list, and never repeat an id. \
Return JSON only, in this shape: \
{\"recommendations\": [{\"recipe_id\": \"<uuid>\", \"explanation\": \"<one sentence for the user>\"}]}";

/// Why a batch was returned in its scored order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
	Disabled,
	Timeout,
	Provider,
	Malformed,
	UnknownId,
	DuplicateId,
	Empty,
}
impl FallbackReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Disabled => "disabled",
			Self::Timeout => "timeout",
			Self::Provider => "provider",
			Self::Malformed => "malformed",
			Self::UnknownId => "unknown_id",
			Self::DuplicateId => "duplicate_id",
			Self::Empty => "empty",
		}
	}
}

#[derive(Debug)]
pub struct Refinement {
	pub state: RefinementState,
	pub candidates: Vec<ScoredCandidate>,
	pub fallback: Option<FallbackReason>,
}

pub struct RefinementGateway {
	provider: Arc<dyn RefinementProvider>,
	llm: LlmProviderConfig,
	cfg: tadka_config::Refinement,
}
impl RefinementGateway {
	pub fn new(
		provider: Arc<dyn RefinementProvider>,
		llm: LlmProviderConfig,
		cfg: tadka_config::Refinement,
	) -> Self {
		Self { provider, llm, cfg }
	}

	/// Asks the refiner to reorder and annotate `top_slice`. Any failure returns the first `limit`
	/// candidates of `top_slice` unchanged.
	pub async fn refine(
		&self,
		top_slice: Vec<ScoredCandidate>,
		context: &UserTasteContext,
		meta: &RequestMeta,
		limit: usize,
	) -> Refinement {
		if !self.cfg.enabled {
			return fallback(top_slice, limit, FallbackReason::Disabled);
		}
		if top_slice.is_empty() {
			return fallback(top_slice, limit, FallbackReason::Empty);
		}

		let window = top_slice.len().min(self.cfg.max_candidates as usize);
		let messages = build_messages(&top_slice[..window], context, meta, limit);
		let call = self.provider.refine(&self.llm, &messages);
		let reply = match tokio::time::timeout(Duration::from_millis(self.cfg.timeout_ms), call).await
		{
			Ok(Ok(reply)) => reply,
			Ok(Err(err)) => {
				tracing::warn!(user_id = context.user_id.as_str(), error = %err, "Refiner call failed.");

				return fallback(top_slice, limit, FallbackReason::Provider);
			},
			Err(_) => {
				tracing::warn!(
					user_id = context.user_id.as_str(),
					timeout_ms = self.cfg.timeout_ms,
					"Refiner call timed out."
				);

				return fallback(top_slice, limit, FallbackReason::Timeout);
			},
		};
		let known: Vec<Uuid> =
			top_slice[..window].iter().map(|candidate| candidate.item.recipe_id).collect();

		match parse_selection(&reply, &known, limit) {
			Ok(selection) => Refinement {
				state: RefinementState::Refined,
				candidates: apply_selection(top_slice, selection),
				fallback: None,
			},
			Err(reason) => {
				tracing::warn!(
					user_id = context.user_id.as_str(),
					reason = reason.as_str(),
					"Refiner reply rejected."
				);

				fallback(top_slice, limit, reason)
			},
		}
	}
}

fn fallback(mut candidates: Vec<ScoredCandidate>, limit: usize, reason: FallbackReason) -> Refinement {
	candidates.truncate(limit);

	Refinement {
		state: RefinementState::UnrefinedFallback,
		candidates,
		fallback: Some(reason),
	}
}

fn build_messages(
	candidates: &[ScoredCandidate],
	context: &UserTasteContext,
	meta: &RequestMeta,
	limit: usize,
) -> Vec<Value> {
	let listed: Vec<Value> = candidates
		.iter()
		.map(|candidate| {
			json!({
				"recipe_id": candidate.item.recipe_id,
				"title": candidate.item.title,
				"description": candidate.item.description,
				"tags": tag_keys(&candidate.item.tags),
				"total_time_minutes": candidate.item.total_time_minutes,
				"score": candidate.combined,
			})
		})
		.collect();
	let user = json!({
		"profile": context.summary,
		"meal_type": meta.meal_type,
		"pantry_ingredients": meta.pantry_ingredients,
		"max_results": limit,
		"candidates": listed,
	});

	vec![
		json!({ "role": "system", "content": SYSTEM_PROMPT }),
		json!({ "role": "user", "content": user.to_string() }),
	]
}

/// Accepts `{"recommendations": [...]}` or a bare array of `{recipe_id, explanation}` objects.
/// The selection must be a non-empty ordered subset of `known`; it is cut to `limit`.
fn parse_selection(
	reply: &Value,
	known: &[Uuid],
	limit: usize,
) -> Result<Vec<(Uuid, String)>, FallbackReason> {
	let entries = match reply {
		Value::Array(entries) => entries,
		Value::Object(object) => object
			.get("recommendations")
			.and_then(Value::as_array)
			.ok_or(FallbackReason::Malformed)?,
		_ => return Err(FallbackReason::Malformed),
	};
	let mut seen = BTreeSet::new();
	let mut selection = Vec::with_capacity(entries.len().min(limit));

	for entry in entries {
		let recipe_id = entry
			.get("recipe_id")
			.and_then(Value::as_str)
			.and_then(|raw| Uuid::parse_str(raw.trim()).ok())
			.ok_or(FallbackReason::Malformed)?;
		let explanation = entry
			.get("explanation")
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|text| !text.is_empty())
			.ok_or(FallbackReason::Malformed)?;

		if !known.contains(&recipe_id) {
			return Err(FallbackReason::UnknownId);
		}
		if !seen.insert(recipe_id) {
			return Err(FallbackReason::DuplicateId);
		}

		selection.push((recipe_id, explanation.to_string()));
	}

	if selection.is_empty() {
		return Err(FallbackReason::Empty);
	}

	selection.truncate(limit);

	Ok(selection)
}

fn apply_selection(
	candidates: Vec<ScoredCandidate>,
	selection: Vec<(Uuid, String)>,
) -> Vec<ScoredCandidate> {
	let mut pool: Vec<Option<ScoredCandidate>> = candidates.into_iter().map(Some).collect();
	let mut ordered: Vec<ScoredCandidate> = selection
		.into_iter()
		.filter_map(|(recipe_id, explanation)| {
			let slot = pool.iter_mut().find(|slot| {
				slot.as_ref().is_some_and(|candidate| candidate.item.recipe_id == recipe_id)
			})?;
			let mut candidate = slot.take()?;

			candidate.explanation = Some(explanation);

			Some(candidate)
		})
		.collect();

	ranker::assign_ranks(&mut ordered);

	ordered
}
