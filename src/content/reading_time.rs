//! Reading-time estimation

use super::ContentBlock;

/// Average reading speed used when none is configured
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Estimate reading time in whole minutes at 200 words per minute
pub fn estimate(content: &[ContentBlock]) -> u32 {
    estimate_with_speed(content, DEFAULT_WORDS_PER_MINUTE)
}

/// Estimate reading time in whole minutes, rounding any partial minute up.
///
/// Only block bodies are counted. A speed of zero falls back to the default.
pub fn estimate_with_speed(content: &[ContentBlock], words_per_minute: usize) -> u32 {
    let speed = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };

    let words: usize = content.iter().map(|block| block.body.word_count()).sum();
    u32::try_from(words.div_ceil(speed)).unwrap_or(u32::MAX)
}
