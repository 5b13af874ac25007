use unicode_segmentation::UnicodeSegmentation;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub window_tokens: u32,
	pub stride_tokens: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
	pub index: i32,
	pub text: String,
	pub token_offset: u32,
	pub token_count: u32,
	/// 1-based, inclusive.
	pub start_line: u32,
	/// 1-based, inclusive.
	pub end_line: u32,
}

/// Split `text` into overlapping token-aligned windows with line provenance.
///
/// Tokens are the non-whitespace word-bound segments of the input; windows
/// cover the whole token range `[0, L)` with no gaps, stepping by
/// `stride_tokens` (clamped to `1..=window_tokens`), and the last window may
/// be shorter. Each chunk's text is the input slice spanning its tokens, so
/// offsets survive round trips. Empty or whitespace-only input yields no
/// chunks. Pure and stateless.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
	let tokens: Vec<(usize, &str)> =
		text.split_word_bound_indices().filter(|(_, word)| !word.trim().is_empty()).collect();

	if tokens.is_empty() {
		return Vec::new();
	}

	let window = cfg.window_tokens.max(1) as usize;
	let stride = (cfg.stride_tokens as usize).clamp(1, window);
	let line_starts = line_start_index(text);
	let mut chunks = Vec::new();
	let mut start = 0_usize;
	let mut index = 0_i32;

	loop {
		let end = (start + window).min(tokens.len());
		let (first_byte, _) = tokens[start];
		let (last_byte, last_word) = tokens[end - 1];
		let byte_end = last_byte + last_word.len();

		chunks.push(Chunk {
			index,
			text: text[first_byte..byte_end].to_string(),
			token_offset: start as u32,
			token_count: (end - start) as u32,
			start_line: line_of(&line_starts, first_byte),
			end_line: line_of(&line_starts, byte_end - 1),
		});

		if end == tokens.len() {
			break;
		}

		start += stride;
		index += 1;
	}

	chunks
}

/// Byte offsets at which each line begins; index i holds line i+1's start.
fn line_start_index(text: &str) -> Vec<usize> {
	let mut starts = vec![0_usize];

	for (offset, byte) in text.bytes().enumerate() {
		if byte == b'\n' {
			starts.push(offset + 1);
		}
	}

	starts
}

fn line_of(line_starts: &[usize], byte_offset: usize) -> u32 {
	line_starts.partition_point(|start| *start <= byte_offset) as u32
}
