use ahash::AHashMap;

#[derive(Clone, Copy)]
struct MmrPick {
	remaining_pos: usize,
	mmr_score: f32,
	original_rank: usize,
}
impl MmrPick {
	fn better_than(self, other: &Self) -> bool {
		self.mmr_score > other.mmr_score
			|| (self.mmr_score == other.mmr_score && self.original_rank < other.original_rank)
	}
}

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

/// Greedy maximal-marginal-relevance selection over a relevance-sorted
/// candidate list.
///
/// Each step picks the remaining candidate maximizing
/// `lambda * relevance - (1 - lambda) * max_similarity_to_selected`. The
/// first pick is always the top-relevance candidate. A candidate with no
/// embedding gets a similarity term of zero and stays selectable. Returns
/// selected ids in selection order, at most `top_k` of them.
pub fn max_marginal_relevance(
	candidates: &[(String, f32)],
	embeddings: &AHashMap<String, Vec<f32>>,
	lambda: f32,
	top_k: usize,
) -> Vec<String> {
	if candidates.is_empty() || top_k == 0 {
		return Vec::new();
	}

	let mut selected_indices = vec![0_usize];
	let mut remaining_indices: Vec<usize> = (1..candidates.len()).collect();

	while selected_indices.len() < top_k && !remaining_indices.is_empty() {
		let mut best: Option<MmrPick> = None;

		for (remaining_pos, candidate_idx) in remaining_indices.iter().copied().enumerate() {
			let redundancy =
				max_selected_similarity(candidate_idx, &selected_indices, candidates, embeddings);
			let relevance = candidates[candidate_idx].1;
			let pick = MmrPick {
				remaining_pos,
				mmr_score: lambda * relevance - (1.0 - lambda) * redundancy,
				original_rank: candidate_idx,
			};

			if best.as_ref().map(|current| pick.better_than(current)).unwrap_or(true) {
				best = Some(pick);
			}
		}

		let Some(pick) = best else { break };
		let picked_idx = remaining_indices.remove(pick.remaining_pos);

		selected_indices.push(picked_idx);
	}

	selected_indices.into_iter().map(|idx| candidates[idx].0.clone()).collect()
}

fn max_selected_similarity(
	candidate_idx: usize,
	selected_indices: &[usize],
	candidates: &[(String, f32)],
	embeddings: &AHashMap<String, Vec<f32>>,
) -> f32 {
	let Some(candidate_vec) = embeddings.get(&candidates[candidate_idx].0) else {
		return 0.0;
	};
	let mut best = 0.0_f32;

	for selected_idx in selected_indices {
		let Some(selected_vec) = embeddings.get(&candidates[*selected_idx].0) else {
			continue;
		};
		let Some(similarity) = cosine_similarity(candidate_vec, selected_vec) else {
			continue;
		};

		if similarity > best {
			best = similarity;
		}
	}

	best
}
