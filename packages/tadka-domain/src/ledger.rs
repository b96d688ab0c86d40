use std::collections::BTreeMap;

use time::{Duration, OffsetDateTime};

use crate::model::{ActionKind, Affinity, AffinityMap, TaggedSignal, tag_keys};

#[derive(Clone, Debug)]
pub struct SignalPolicy {
	pub weights: [(ActionKind, f32); 8],
	pub swipe_lookback: Duration,
	pub cooking_lookback: Duration,
	pub min_view_dwell_secs: f32,
	pub confidence_half_saturation: f32,
}
impl SignalPolicy {
	pub fn from_config(cfg: &tadka_config::Signals) -> Self {
		let weights = &cfg.weights;

		Self {
			weights: [
				(ActionKind::Like, weights.like),
				(ActionKind::Save, weights.save),
				(ActionKind::Skip, weights.skip),
				(ActionKind::View, weights.view),
				(ActionKind::StrongDislike, weights.strong_dislike),
				(ActionKind::Cooked, weights.cooked),
				(ActionKind::WouldCookAgain, weights.would_cook_again),
				(ActionKind::WouldNotCookAgain, weights.would_not_cook_again),
			],
			swipe_lookback: Duration::days(cfg.swipe_lookback_days),
			cooking_lookback: Duration::days(cfg.cooking_lookback_days),
			min_view_dwell_secs: cfg.min_view_dwell_secs,
			confidence_half_saturation: cfg.confidence_half_saturation,
		}
	}

	pub fn weight(&self, kind: ActionKind) -> f32 {
		self.weights.iter().find(|(candidate, _)| *candidate == kind).map(|(_, w)| *w).unwrap_or(0.0)
	}

	pub fn lookback(&self, kind: ActionKind) -> Duration {
		if kind.is_cooking() { self.cooking_lookback } else { self.swipe_lookback }
	}

	/// Oldest timestamp any signal kind can still contribute from.
	pub fn earliest_relevant(&self, now: OffsetDateTime) -> OffsetDateTime {
		now - self.swipe_lookback.max(self.cooking_lookback)
	}

	fn counts(&self, event: &TaggedSignal, now: OffsetDateTime) -> bool {
		if now - event.occurred_at > self.lookback(event.action) {
			return false;
		}
		if event.action == ActionKind::View
			&& let Some(dwell) = event.dwell_secs
			&& dwell < self.min_view_dwell_secs
		{
			return false;
		}

		true
	}
}
impl Default for SignalPolicy {
	fn default() -> Self {
		Self::from_config(&tadka_config::Signals::default())
	}
}

/// Folds a user's interaction window into per-attribute affinities.
///
/// Every flattened tag of the touched recipe receives the action weight. Sums are divided by the
/// largest absolute sum, so the strongest attribute lands on -1 or 1 and the rest scale with it.
pub fn accumulate(events: &[TaggedSignal], now: OffsetDateTime, policy: &SignalPolicy) -> AffinityMap {
	let mut sums: BTreeMap<String, (f32, u32)> = BTreeMap::new();

	for event in events.iter().filter(|event| policy.counts(event, now)) {
		let weight = policy.weight(event.action);

		for key in tag_keys(&event.tags) {
			let slot = sums.entry(key).or_insert((0.0, 0));

			slot.0 += weight;
			slot.1 += 1;
		}
	}

	let max_abs = sums.values().map(|(sum, _)| sum.abs()).fold(0.0_f32, f32::max);
	let entries = sums
		.into_iter()
		.map(|(key, (sum, observations))| {
			let score = if max_abs > 0.0 { (sum / max_abs).clamp(-1.0, 1.0) } else { 0.0 };
			let n = observations as f32;
			let confidence = n / (n + policy.confidence_half_saturation);

			(key, Affinity { score, confidence, observations })
		})
		.collect();

	AffinityMap::from_entries(entries)
}
