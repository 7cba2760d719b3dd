//! Repair of character-spaced text emitted by some PDF extractors.
//!
//! Certain fonts/encodings come out of text extraction as `"S E P / 1 5"`
//! instead of `"SEP/15"`. [`clean_spaced_text`] collapses such lines with a
//! line-local heuristic:
//!
//! - split the line on single spaces (empty tokens are kept and counted);
//! - if there are more than [`MIN_TOKENS`] tokens **and** more than
//!   [`SINGLE_CHAR_RATIO`] of them are exactly one character long, join the
//!   tokens with no separator;
//! - otherwise leave the line untouched.
//!
//! Short lines (`"A B C"`) are never rewritten. The thresholds are fixed;
//! changing them changes observable output.

/// A line must have strictly more tokens than this to be considered.
pub const MIN_TOKENS: usize = 5;

/// Fraction of single-character tokens a line must strictly exceed.
pub const SINGLE_CHAR_RATIO: f64 = 0.5;

/// Collapse character-spaced lines in `text`. Pure and stateless.
pub fn clean_spaced_text(text: &str) -> String {
    text.split('\n')
        .map(clean_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_line(line: &str) -> String {
    if is_character_spaced(line) {
        line.split(' ').collect()
    } else {
        line.to_string()
    }
}

/// `true` if `line` looks like one-character-per-token extraction output.
pub fn is_character_spaced(line: &str) -> bool {
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() <= MIN_TOKENS {
        return false;
    }
    let single = tokens.iter().filter(|t| t.chars().count() == 1).count();
    (single as f64 / tokens.len() as f64) > SINGLE_CHAR_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_fully_spaced_date() {
        assert_eq!(clean_spaced_text("S E P / 1 5"), "SEP/15");
    }

    #[test]
    fn short_lines_are_never_touched() {
        assert_eq!(clean_spaced_text("This is fine"), "This is fine");
        assert_eq!(clean_spaced_text("A B C"), "A B C");
        // five tokens, all single characters
        assert_eq!(clean_spaced_text("a b c d e"), "a b c d e");
    }

    #[test]
    fn minority_single_char_tokens_keep_line() {
        // 6 tokens, 2 single-char (33%)
        let line = "I built a data pipeline x";
        assert_eq!(clean_spaced_text(line), line);
    }

    #[test]
    fn exactly_half_is_not_enough() {
        // 6 tokens, 3 single-char: ratio must be strictly above 0.5
        let line = "a b c word other thing";
        assert_eq!(clean_spaced_text(line), line);
    }

    #[test]
    fn only_offending_lines_change() {
        let text = "Jane Doe\nD A T A  E N G I N E E R\nBuilt ETL pipelines in Spark";
        let cleaned = clean_spaced_text(text);
        let lines: Vec<&str> = cleaned.lines().collect();
        assert_eq!(lines[0], "Jane Doe");
        assert_eq!(lines[1], "DATAENGINEER");
        assert_eq!(lines[2], "Built ETL pipelines in Spark");
    }

    #[test]
    fn empty_tokens_count_towards_total() {
        // "1  2  3" splits into ["1", "", "2", "", "3"]: five tokens, untouched
        assert_eq!(clean_spaced_text("1  2  3"), "1  2  3");
        assert!(!is_character_spaced("1  2  3"));
    }

    #[test]
    fn multibyte_characters_count_as_single() {
        assert_eq!(clean_spaced_text("é t é / 2 0"), "été/20");
    }

    #[test]
    fn preserves_line_structure_and_empty_lines() {
        let text = "first\n\nsecond\n";
        assert_eq!(clean_spaced_text(text), text);
    }
}
