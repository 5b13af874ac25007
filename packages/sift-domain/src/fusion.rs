use std::cmp::Ordering;

use ahash::AHashMap;

pub const DEFAULT_RRF_K: f32 = 30.0;
pub const DEFAULT_DENSE_WEIGHT: f32 = 1.5;
pub const DEFAULT_LEXICAL_WEIGHT: f32 = 0.2;

/// One ranked input list: ids in rank order (rank 0 first) plus the weight
/// its votes carry.
#[derive(Clone, Debug)]
pub struct FusionInput<'a> {
	pub weight: f32,
	pub ids: Vec<&'a str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FusedEntry {
	pub id: String,
	pub score: f32,
}

/// Weighted reciprocal-rank fusion: `score(id) = Σ weight / (k + rank)` over
/// every list containing the id. Absence from a list contributes nothing.
///
/// Entries come back sorted by score descending; exact ties keep
/// first-encounter order (lists scanned in argument order, each front to
/// back), which is the stable rule callers and tests rely on.
pub fn reciprocal_rank_fusion(lists: &[FusionInput<'_>], k: f32) -> Vec<FusedEntry> {
	let mut scores: AHashMap<&str, (f32, usize)> = AHashMap::new();
	let mut encounter = 0_usize;

	for list in lists {
		for (rank, id) in list.ids.iter().copied().enumerate() {
			let contribution = list.weight / (k + rank as f32);

			match scores.get_mut(id) {
				Some((score, _)) => {
					*score += contribution;
				},
				None => {
					scores.insert(id, (contribution, encounter));

					encounter += 1;
				},
			}
		}
	}

	let mut out: Vec<(&str, f32, usize)> =
		scores.into_iter().map(|(id, (score, seen))| (id, score, seen)).collect();

	out.sort_by(|left, right| {
		cmp_f32_desc(left.1, right.1).then_with(|| left.2.cmp(&right.2))
	});

	out.into_iter().map(|(id, score, _)| FusedEntry { id: id.to_string(), score }).collect()
}

/// Descending float ordering that pushes NaN to the end instead of poisoning
/// the sort.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
