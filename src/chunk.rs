//! Whitespace-boundary text chunker.
//!
//! Splits file content into [`Chunk`]s of at most `max_chars` characters so
//! each one fits in a completion prompt. Splitting only happens inside a run
//! of whitespace; words are never broken, so a single word longer than
//! `max_chars` becomes its own oversized chunk. Whitespace inside a chunk is
//! kept verbatim; the whitespace run at each split point is dropped.

use crate::models::Chunk;

/// Split text into chunks of at most `max_chars` characters.
/// Returns chunks with contiguous indices starting at 0.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chars.max(1);

    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    // Byte range and char length of the chunk being built.
    let mut current: Option<(usize, usize, usize)> = None;
    // Char length of the whitespace run since the last word.
    let mut gap = 0usize;

    for (start, word, is_space) in segments(text) {
        let len = word.chars().count();
        if is_space {
            if current.is_some() {
                gap = len;
            }
            continue;
        }

        let end = start + word.len();
        current = match current {
            None => Some((start, end, len)),
            Some((s, _, used)) if used + gap + len <= max_chars => Some((s, end, used + gap + len)),
            Some((s, e, _)) => {
                push_chunk(&mut chunks, &text[s..e]);
                Some((start, end, len))
            }
        };
        gap = 0;
    }

    if let Some((s, e, _)) = current {
        push_chunk(&mut chunks, &text[s..e]);
    }

    // Whitespace-only input still yields one chunk
    if chunks.is_empty() {
        push_chunk(&mut chunks, text);
    }

    chunks
}

fn push_chunk(chunks: &mut Vec<Chunk>, text: &str) {
    chunks.push(Chunk {
        index: chunks.len(),
        text: text.to_string(),
    });
}

/// Alternating runs of whitespace and non-whitespace as `(byte_offset, run, is_whitespace)`.
fn segments(text: &str) -> Vec<(usize, &str, bool)> {
    let mut out = Vec::new();
    let mut run_start = 0usize;
    let mut run_space: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        match run_space {
            Some(prev) if prev == space => {}
            Some(prev) => {
                out.push((run_start, &text[run_start..i], prev));
                run_start = i;
                run_space = Some(space);
            }
            None => run_space = Some(space),
        }
    }
    if let Some(space) = run_space {
        out.push((run_start, &text[run_start..], space));
    }
    out
}
