//! Minified and generated file detection.

use crate::config::StaticThresholds;
use crate::core::Language;

/// Whether a file looks minified or machine generated.
///
/// Source maps and JSON are always candidates, as is any `.min.` file name.
/// Otherwise a file qualifies when its longest line and its average line
/// length both cross the configured bounds.
pub fn is_minified_candidate(
    file_name_lower: &str,
    language: Language,
    text: &str,
    thresholds: &StaticThresholds,
) -> bool {
    if language.is_generated_format() || file_name_lower.contains(".min.") {
        return true;
    }

    let mut lines = 0usize;
    let mut chars = 0usize;
    let mut longest = 0usize;
    for line in text.lines() {
        let len = line.chars().count();
        lines += 1;
        chars += len;
        longest = longest.max(len);
    }
    if lines == 0 {
        return false;
    }

    longest >= thresholds.minified_line_length
        && chars / lines >= thresholds.minified_avg_line_length
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(name: &str, lang: Language, text: &str) -> bool {
        is_minified_candidate(name, lang, text, &StaticThresholds::default())
    }

    #[test]
    fn test_generated_formats_are_always_candidates() {
        assert!(detect("package.json", Language::Json, "{\n  \"a\": 1\n}\n"));
        assert!(detect("app.js.map", Language::SourceMap, ""));
    }

    #[test]
    fn test_min_file_name() {
        assert!(detect("jquery.min.js", Language::JavaScript, "var a = 1;\n"));
    }

    #[test]
    fn test_single_long_line_is_minified() {
        let bundle = "var a=1;".repeat(100);
        assert!(detect("bundle.js", Language::JavaScript, &bundle));
    }

    #[test]
    fn test_one_long_line_in_normal_file_is_not() {
        let mut text = "let x = 1;\n".repeat(50);
        text.push_str(&"y".repeat(400));
        assert!(!detect("app.js", Language::JavaScript, &text));
    }

    #[test]
    fn test_empty_file_is_not_minified() {
        assert!(!detect("empty.js", Language::JavaScript, ""));
    }
}
