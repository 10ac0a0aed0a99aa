//! Weighted blending of dense and lexical candidate lists.

use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use crate::candidate::{Candidate, IdentityKey, Provenance};

/// Scales raw scores by the list maximum so the top candidate maps to 1.0. Scores at or below
/// zero map to 0, and so does every score when the maximum is not positive.
pub fn normalize_scores(candidates: &mut [Candidate]) {
	let max =
		candidates.iter().map(|candidate| candidate.raw_score).fold(f32::NEG_INFINITY, f32::max);

	for candidate in candidates.iter_mut() {
		let normalized =
			if max > 0.0 && max.is_finite() { (candidate.raw_score / max).max(0.0) } else { 0.0 };

		candidate.normalized_score = Some(normalized);
	}
}

/// Blends the two lists into at most `top_k` candidates with one entry per identity key.
///
/// When one side is empty the other is returned truncated and otherwise untouched.
pub fn fuse(
	mut dense: Vec<Candidate>,
	mut sparse: Vec<Candidate>,
	alpha: f32,
	top_k: usize,
) -> Vec<Candidate> {
	match (dense.is_empty(), sparse.is_empty()) {
		(true, true) => return Vec::new(),
		(false, true) => {
			dense.truncate(top_k);

			return dense;
		},
		(true, false) => {
			sparse.truncate(top_k);

			return sparse;
		},
		(false, false) => {},
	}

	normalize_scores(&mut dense);
	normalize_scores(&mut sparse);

	let mut merged = OrderedCandidates::with_capacity(dense.len() + sparse.len());

	for candidate in dense {
		let weighted = alpha * candidate.normalized_score.unwrap_or(0.0);

		merged.merge(candidate, weighted, Provenance::Dense);
	}
	for candidate in sparse {
		let weighted = (1.0 - alpha) * candidate.normalized_score.unwrap_or(0.0);

		merged.merge(candidate, weighted, Provenance::Sparse);
	}

	let mut fused = merged.into_vec();

	fused.sort_by(|left, right| {
		cmp_f32_desc(left.hybrid_score.unwrap_or(0.0), right.hybrid_score.unwrap_or(0.0))
	});
	fused.truncate(top_k);

	fused
}

/// Drops later candidates whose identity key was already seen.
pub fn dedup_by_identity(candidates: Vec<Candidate>) -> Vec<Candidate> {
	let mut seen = HashSet::with_capacity(candidates.len());
	let mut unique = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		if seen.insert(candidate.identity_key()) {
			unique.push(candidate);
		}
	}

	unique
}

/// NaN sorts last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

struct OrderedCandidates {
	positions: HashMap<IdentityKey, usize>,
	items: Vec<Candidate>,
}
impl OrderedCandidates {
	fn with_capacity(capacity: usize) -> Self {
		Self { positions: HashMap::with_capacity(capacity), items: Vec::with_capacity(capacity) }
	}

	fn merge(&mut self, mut candidate: Candidate, weighted: f32, source: Provenance) {
		let key = candidate.identity_key();

		if let Some(&position) = self.positions.get(&key) {
			let existing = &mut self.items[position];

			existing.hybrid_score = Some(existing.hybrid_score.unwrap_or(0.0) + weighted);

			// Any lexical hit on a seen key marks it hybrid, including a repeated lexical hit.
			if source == Provenance::Sparse {
				existing.provenance = Provenance::Hybrid;
			}

			return;
		}

		candidate.hybrid_score = Some(weighted);
		candidate.provenance = source;

		self.positions.insert(key, self.items.len());
		self.items.push(candidate);
	}

	fn into_vec(self) -> Vec<Candidate> {
		self.items
	}
}
