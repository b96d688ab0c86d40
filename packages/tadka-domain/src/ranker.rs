use std::{cmp::Ordering, collections::BTreeSet};

use rayon::prelude::*;
use time::OffsetDateTime;

use tadka_config::{Ranking, RankingDiversity, RankingFreshness, RankingPantry, RankingWeights};

use crate::{
	model::{AffinityMap, ComponentScores, RetrievedCandidate, ScoredCandidate},
	scoring, text,
};

pub use rayon::ThreadPoolBuildError;

#[derive(Clone, Debug, Default)]
pub struct RankingPolicy {
	pub weights: RankingWeights,
	pub pantry: RankingPantry,
	pub diversity: RankingDiversity,
	pub freshness: RankingFreshness,
}
impl RankingPolicy {
	pub fn from_config(cfg: &Ranking) -> Self {
		Self {
			weights: cfg.weights.clone(),
			pantry: cfg.pantry.clone(),
			diversity: cfg.diversity.clone(),
			freshness: cfg.freshness.clone(),
		}
	}

	fn combine(&self, scores: &ComponentScores) -> f32 {
		self.weights.vector * scores.vector
			+ self.weights.feedback * scores.feedback
			+ self.weights.diversity * scores.diversity
			+ self.weights.freshness * scores.freshness
			+ self.pantry.weight * scores.pantry
	}
}

pub struct RankInput<'a> {
	pub affinity: &'a AffinityMap,
	pub pantry: &'a [String],
	pub now: OffsetDateTime,
	/// Maximum number of candidates to emit.
	pub window: usize,
}

/// Per-candidate scores that do not depend on any other candidate.
struct Independent {
	candidate: RetrievedCandidate,
	scores: ComponentScores,
	title_words: BTreeSet<String>,
}

/// Hybrid ranker owning the bounded scoring pool.
pub struct HybridRanker {
	policy: RankingPolicy,
	pool: rayon::ThreadPool,
}
impl HybridRanker {
	/// `threads == 0` sizes the pool to the number of CPU cores.
	pub fn new(policy: RankingPolicy, threads: usize) -> Result<Self, ThreadPoolBuildError> {
		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(threads)
			.thread_name(|index| format!("tadka-score-{index}"))
			.build()?;

		Ok(Self { policy, pool })
	}

	pub fn from_config(cfg: &Ranking) -> Result<Self, ThreadPoolBuildError> {
		Self::new(RankingPolicy::from_config(cfg), cfg.scoring_threads)
	}

	pub fn policy(&self) -> &RankingPolicy {
		&self.policy
	}

	/// Scores and orders `candidates`.
	///
	/// Vector, feedback, freshness and pantry scores run on the pool. Diversity is then folded
	/// sequentially in vector order, each candidate compared against every title processed before
	/// it. The result is ordered by combined score, ties broken by recipe id, and cut to
	/// `input.window`.
	pub fn rank(
		&self,
		candidates: Vec<RetrievedCandidate>,
		input: &RankInput<'_>,
	) -> Vec<ScoredCandidate> {
		let policy = &self.policy;
		let mut independent: Vec<Independent> = self.pool.install(|| {
			candidates
				.into_par_iter()
				.map(|candidate| score_independent(candidate, input, policy))
				.collect()
		});

		independent.sort_by(|left, right| {
			cmp_f32_desc(left.scores.vector, right.scores.vector)
				.then_with(|| left.candidate.item.recipe_id.cmp(&right.candidate.item.recipe_id))
		});

		let (mut scored, _) = independent.into_iter().fold(
			(Vec::new(), Vec::new()),
			|(mut scored, mut processed): (Vec<ScoredCandidate>, Vec<BTreeSet<String>>), entry| {
				let mut scores = entry.scores;

				scores.diversity =
					scoring::diversity_score(&entry.title_words, &processed, &policy.diversity);

				processed.push(entry.title_words);
				scored.push(ScoredCandidate {
					item: entry.candidate.item,
					combined: policy.combine(&scores),
					scores,
					rank: 0,
					explanation: None,
				});

				(scored, processed)
			},
		);

		scored.sort_by(|left, right| {
			cmp_f32_desc(left.combined, right.combined)
				.then_with(|| left.item.recipe_id.cmp(&right.item.recipe_id))
		});
		scored.truncate(input.window);
		assign_ranks(&mut scored);

		scored
	}
}

/// Rewrites ranks as 1-based positions.
pub fn assign_ranks(candidates: &mut [ScoredCandidate]) {
	for (index, candidate) in candidates.iter_mut().enumerate() {
		candidate.rank = index as u32 + 1;
	}
}

fn score_independent(
	candidate: RetrievedCandidate,
	input: &RankInput<'_>,
	policy: &RankingPolicy,
) -> Independent {
	let item = &candidate.item;
	let scores = ComponentScores {
		vector: scoring::vector_score(candidate.vector_score),
		feedback: scoring::feedback_score(&item.tags, input.affinity),
		diversity: 0.0,
		freshness: scoring::freshness_score(item.created_at, input.now, &policy.freshness),
		pantry: scoring::pantry_ratio(&item.title, input.pantry, policy.pantry.match_cap),
	};
	let title_words = text::significant_words(&item.title, policy.diversity.min_word_chars);

	Independent { candidate, scores, title_words }
}

fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
