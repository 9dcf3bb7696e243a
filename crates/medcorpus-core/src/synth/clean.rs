//! Description cleaning: keep the first sentence of a free-text field.

use regex::Regex;
use std::sync::LazyLock;

/// Cleaned text shorter than this (in characters) is discarded.
pub const MIN_CLEANED_CHARS: usize = 10;

static LEADING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s•\-\*]+").unwrap());

/// Strip leading bullets, cut at the first `.` or newline, and drop the
/// result if fewer than [`MIN_CLEANED_CHARS`] characters remain.
///
/// `clean(clean(x)) == clean(x)` for every `x`.
pub fn clean(text: &str) -> Option<String> {
    let stripped = LEADING_MARKERS.replace(text, "");
    let first_sentence = stripped
        .split(|c: char| c == '.' || c == '\n')
        .next()
        .unwrap_or_default()
        .trim();
    if first_sentence.chars().count() < MIN_CLEANED_CHARS {
        return None;
    }
    Some(first_sentence.to_string())
}

/// [`clean`] over an optional field.
pub fn clean_opt(text: Option<&str>) -> Option<String> {
    text.and_then(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_sentence() {
        assert_eq!(
            clean("D is a chronic disorder occurring in adults. It is rare.").as_deref(),
            Some("D is a chronic disorder occurring in adults")
        );
        assert_eq!(
            clean("Viêm phổi do vi khuẩn\nDòng thứ hai").as_deref(),
            Some("Viêm phổi do vi khuẩn")
        );
    }

    #[test]
    fn strips_leading_markers() {
        assert_eq!(
            clean("  • - * Thuốc giảm đau hạ sốt.").as_deref(),
            Some("Thuốc giảm đau hạ sốt")
        );
        assert_eq!(
            clean("\n\n- first line here\nsecond").as_deref(),
            Some("first line here")
        );
    }

    #[test]
    fn discards_short_text() {
        // 8 characters
        assert_eq!(clean("Bệnh lý."), None);
        assert_eq!(clean("abcdefgh"), None);
        assert_eq!(clean(""), None);
        assert_eq!(clean("   "), None);
        assert_eq!(clean(". leading period hides everything"), None);
        // Trailing whitespace does not count towards the floor.
        assert_eq!(clean("abcdefgh   ."), None);
    }

    #[test]
    fn length_floor_counts_characters_not_bytes() {
        // 10 characters, more than 10 bytes.
        let text = "đau đầu dữ";
        assert_eq!(text.chars().count(), 10);
        assert_eq!(clean(text).as_deref(), Some(text));
        assert_eq!(clean("đau đầu d"), None);
    }

    #[test]
    fn idempotent_and_never_short() {
        let samples = [
            "D is a chronic disorder occurring in adults.",
            "  * - Nhiễm trùng đường hô hấp trên. Thường gặp ở trẻ em.",
            "•Một dòng\nthứ hai dài hơn nhiều",
            "-- -- -- ---",
            "** bullet then a fairly long clause without stop",
            "x.y.z",
            "\t\tTab-led description of a drug\r\nnext",
        ];
        for sample in samples {
            if let Some(once) = clean(sample) {
                assert!(once.chars().count() >= MIN_CLEANED_CHARS, "{once:?}");
                assert!(!once.is_empty());
                assert_eq!(clean(&once).as_deref(), Some(once.as_str()), "{sample:?}");
            }
        }
    }

    #[test]
    fn clean_opt_handles_absence() {
        assert_eq!(clean_opt(None), None);
        assert!(clean_opt(Some("Một mô tả đủ dài.")).is_some());
    }
}
