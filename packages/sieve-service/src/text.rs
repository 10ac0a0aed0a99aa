use unicode_segmentation::UnicodeSegmentation;

/// Keeps at most `max_graphemes` user-perceived characters.
pub fn truncate_graphemes(text: &str, max_graphemes: usize) -> &str {
	match text.grapheme_indices(true).nth(max_graphemes) {
		Some((offset, _)) => &text[..offset],
		None => text,
	}
}

pub fn grapheme_len(text: &str) -> usize {
	text.graphemes(true).count()
}
