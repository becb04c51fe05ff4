//! Reading-time estimation

use super::post::ContentBlock;
use crate::helpers::strip_html;

/// Assumed reading speed
pub const WORDS_PER_MINUTE: u32 = 200;

/// Whitespace-separated words; empty tokens never count
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words in a section: its heading plus every body fragment with tags stripped
pub fn block_words(block: &ContentBlock) -> usize {
    let body: usize = block
        .body
        .iter()
        .map(|fragment| count_words(&strip_html(&fragment.html)))
        .sum();
    count_words(&block.heading) + body
}

/// Minutes to read at [`WORDS_PER_MINUTE`], rounded up
pub fn estimate(blocks: &[ContentBlock]) -> u32 {
    estimate_with(blocks, WORDS_PER_MINUTE)
}

/// Minutes to read at `words_per_minute`, rounded up
pub fn estimate_with(blocks: &[ContentBlock], words_per_minute: u32) -> u32 {
    let words: usize = blocks.iter().map(block_words).sum();
    let minutes = words.div_ceil(words_per_minute.max(1) as usize);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BodyFragment;

    fn block(heading: &str, body: &[&str]) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            body: body
                .iter()
                .map(|html| BodyFragment {
                    html: html.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_post_takes_no_time() {
        assert_eq!(estimate(&[]), 0);
        assert_eq!(estimate(&[block("", &[])]), 0);
    }

    #[test]
    fn test_single_short_block() {
        let blocks = [block("Intro", &["<p>one two three</p>"])];
        assert_eq!(block_words(&blocks[0]), 4);
        assert_eq!(estimate(&blocks), 1);
    }

    #[test]
    fn test_markup_is_not_counted() {
        assert_eq!(count_words(&strip_html("<p>hello <b>world</b></p>")), 2);
        assert_eq!(
            block_words(&block("", &[r#"<p><a href="https://x.y/a b">link</a></p>"#])),
            1
        );
    }

    #[test]
    fn test_rounds_up_at_boundaries() {
        let words = |n: usize| vec!["word"; n].join(" ");
        assert_eq!(estimate(&[block("", &[&words(200)])]), 1);
        assert_eq!(estimate(&[block("", &[&words(201)])]), 2);
        assert_eq!(estimate_with(&[block("", &[&words(201)])], 100), 3);
    }

    #[test]
    fn test_more_text_never_reads_faster() {
        let mut blocks = vec![block("Intro", &["<p>one two</p>"])];
        let mut previous = estimate(&blocks);
        for _ in 0..500 {
            blocks[0].body.push(BodyFragment {
                html: "<p>more words here</p>".to_string(),
            });
            let current = estimate(&blocks);
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 8);
    }

    #[test]
    fn test_zero_speed_is_clamped() {
        assert_eq!(estimate_with(&[block("a b", &[])], 0), 2);
    }
}
