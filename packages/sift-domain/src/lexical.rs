use unicode_normalization::UnicodeNormalization;

/// Width of every lexical vector, globally constant. Changing it invalidates
/// every indexed lexical column.
pub const LEXICAL_DIM: usize = 512;

const DELIMITERS: &str = "_-./\\:;,!?&|+*=<>()[]{}\"'`~#@%^$";

/// English function words plus a few code keywords that carry no retrieval
/// signal on their own.
const STOP_WORDS: &[&str] = &[
	"an", "and", "are", "as", "at", "be", "but", "by", "class", "const", "fn", "for", "from",
	"function", "has", "have", "if", "import", "in", "into", "is", "it", "its", "let", "not", "of",
	"on", "or", "pub", "return", "self", "that", "the", "their", "then", "there", "these", "this",
	"to", "use", "var", "was", "were", "will", "with",
];

/// Hash the token bag of `text` into a fixed-width, L2-normalized vector.
///
/// Identical text always yields bit-identical vectors; indexing and querying
/// must go through this same function. Text with no surviving tokens encodes
/// to the zero vector.
pub fn encode(text: &str) -> Vec<f32> {
	let mut buckets = vec![0.0_f32; LEXICAL_DIM];
	let mut survivors = 0_usize;

	for token in tokenize(text) {
		let bucket = (crate::hash64(&token) % LEXICAL_DIM as u64) as usize;

		buckets[bucket] += 1.0;
		survivors += 1;
	}

	if survivors == 0 {
		return buckets;
	}

	let norm = buckets.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in &mut buckets {
			*value /= norm;
		}
	}

	buckets
}

/// Split on lower-to-upper case transitions and the fixed delimiter set,
/// lowercase, and drop single-character tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
	let normalized: String = text.nfc().collect();
	let mut out = Vec::new();
	let mut current = String::new();
	let mut prev_lowercase = false;

	for ch in normalized.chars() {
		if ch.is_whitespace() || DELIMITERS.contains(ch) {
			push_token(&mut out, &mut current);

			prev_lowercase = false;

			continue;
		}
		if ch.is_uppercase() && prev_lowercase {
			push_token(&mut out, &mut current);
		}

		prev_lowercase = ch.is_lowercase();

		current.extend(ch.to_lowercase());
	}

	push_token(&mut out, &mut current);

	out
}

fn push_token(out: &mut Vec<String>, current: &mut String) {
	if current.chars().count() > 1 && !STOP_WORDS.contains(&current.as_str()) {
		out.push(current.clone());
	}

	current.clear();
}
