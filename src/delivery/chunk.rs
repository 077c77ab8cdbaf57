//! Transport-sized chunking of outgoing text

/// Split `text` into consecutive pieces of at most `size` characters.
///
/// Concatenating the pieces gives back `text` exactly; empty text yields no
/// pieces. Splits land on character boundaries, never inside a code point.
pub fn split_chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0;
    let mut count = 0;

    for (index, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}
