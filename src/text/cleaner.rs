//! Text sanitization for speech synthesis.
//!
//! Runs on chunk text after segmentation, before the synthesis call, so
//! segmentation itself stays lossless.

/// Clean a chunk of text for TTS: map typographic characters to plain
/// ASCII equivalents, drop control and zero-width characters, collapse
/// whitespace, and reduce repeated periods that cause TTS noise.
pub fn clean_text(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{2032}' => mapped.push('\''),
            '\u{201c}' | '\u{201d}' | '\u{2033}' | '\u{00ab}' | '\u{00bb}' => mapped.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2011}' | '\u{2012}' | '\u{2015}' => mapped.push('-'),
            '\u{2026}' => mapped.push_str("..."),
            '\u{00a0}' => mapped.push(' '),
            // Zero-width characters and BOM vanish
            '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' => {}
            '\n' | '\t' => mapped.push(c),
            _ if c.is_control() => {}
            _ => mapped.push(c),
        }
    }

    collapse_periods(&collapse_whitespace(&mapped))
}

/// Collapse runs of spaces/tabs to one space and runs of newlines to at
/// most two.
fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count = 0;

    for c in text.chars() {
        match c {
            '\n' => {
                newline_count += 1;
                prev_was_space = false;
                if newline_count <= 2 {
                    result.push('\n');
                }
            }
            ' ' | '\t' => {
                newline_count = 0;
                if !prev_was_space {
                    result.push(' ');
                    prev_was_space = true;
                }
            }
            _ => {
                newline_count = 0;
                prev_was_space = false;
                result.push(c);
            }
        }
    }

    result.trim().to_string()
}

/// Replace runs of periods with a single period.
fn collapse_periods(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_period_run = false;

    for c in text.chars() {
        if c == '.' {
            if !in_period_run {
                result.push('.');
                in_period_run = true;
            }
        } else {
            in_period_run = false;
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_quotes() {
        let text = "\u{201c}Hello,\u{201d} said John. \u{2018}It\u{2019}s nice.\u{2019}";
        assert_eq!(clean_text(text), "\"Hello,\" said John. 'It's nice.'");
    }

    #[test]
    fn test_dashes() {
        assert_eq!(clean_text("one–two—three"), "one-two-three");
    }

    #[test]
    fn test_ellipsis_collapses() {
        // The ellipsis expands to "..." and the period run then collapses
        assert_eq!(clean_text("Wait… what?"), "Wait. what?");
    }

    #[test]
    fn test_repeated_periods() {
        assert_eq!(clean_text("What.. is... this...."), "What. is. this.");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(
            clean_text("Hello   world\n\n\n\nNew paragraph"),
            "Hello world\n\nNew paragraph"
        );
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(clean_text("Hello\x00World\x07Test"), "HelloWorldTest");
    }

    #[test]
    fn test_zero_width_chars_removed() {
        assert_eq!(clean_text("Hello\u{200b}World\u{feff}Test"), "HelloWorldTest");
    }

    #[test]
    fn test_newlines_preserved() {
        assert_eq!(clean_text("Line 1\nLine 2"), "Line 1\nLine 2");
    }
}
