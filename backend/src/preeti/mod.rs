//! Preeti to Unicode Devanagari conversion.
//!
//! Preeti is a font-level encoding: keystrokes land on glyph slots that
//! look like Devanagari but are Latin codepoints underneath. Conversion runs
//! three substitution tiers (ligatures, digraphs, single glyphs) and then
//! moves the i-matra, which Preeti types before its consonant, to after it.
//!
//! Text that already contains Devanagari is returned unchanged, so
//! [`convert`] is idempotent.
//!
//! # Example
//!
//! ```
//! use payroll::preeti::{convert, looks_like_legacy};
//!
//! assert!(looks_like_legacy("cf"));
//! assert_eq!(convert("cf"), "आ");
//! assert_eq!(convert("आ"), "आ");
//! ```

mod tables;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Reverse;

use crate::models::{Employee, Field};

/// Dependent vowel sign I, typed before its consonant in Preeti.
const I_MATRA: char = '\u{093F}';

/// Glyph sequences characteristic of Preeti-typed text.
static LEGACY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[;sf]|km|cf|em|if|f\]|f\}|\[|\]|\{|\}").expect("static pattern")
});

type Table = Vec<(&'static str, &'static str)>;

static LIGATURES: Lazy<Table> = Lazy::new(|| longest_first(tables::LIGATURES));
static DIGRAPHS: Lazy<Table> = Lazy::new(|| longest_first(tables::DIGRAPHS));

fn longest_first(table: &[(&'static str, &'static str)]) -> Table {
    let mut sorted = table.to_vec();
    // stable: equal lengths keep table order
    sorted.sort_by_key(|(pattern, _)| Reverse(pattern.chars().count()));
    sorted
}

/// Whether the text contains any codepoint of the Devanagari block.
pub fn has_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Coarse check for Preeti-typed text.
///
/// Already-Unicode text is never treated as legacy. Beyond that this is a
/// heuristic: it looks for glyphs common in Preeti input and accepts false
/// positives on plain ASCII.
pub fn looks_like_legacy(text: &str) -> bool {
    if text.is_empty() || has_devanagari(text) {
        return false;
    }
    LEGACY_PATTERN.is_match(text)
}

/// Convert Preeti text to Unicode Devanagari.
pub fn convert(text: &str) -> String {
    if text.is_empty() || has_devanagari(text) {
        return text.to_string();
    }

    let mut working = text.to_string();
    for (pattern, replacement) in LIGATURES.iter().chain(DIGRAPHS.iter()) {
        if working.contains(pattern) {
            working = working.replace(pattern, replacement);
        }
    }

    let mut substituted = String::with_capacity(working.len() * 3);
    for c in working.chars() {
        match tables::single(c) {
            Some(mapped) => substituted.push_str(mapped),
            None => substituted.push(c),
        }
    }

    reorder_i_matra(&substituted)
}

/// Move each i-matra after the character that follows it.
///
/// Single left-to-right pass with one character of lookahead; a swapped
/// pair is consumed whole, so `िि` stays as is. Never swaps across a line
/// break.
fn reorder_i_matra(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == I_MATRA {
            if let Some(&next) = chars.peek() {
                if !is_line_break(next) {
                    out.push(next);
                    out.push(I_MATRA);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }

    out
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Convert the named string fields of a JSON record.
///
/// Returns a copy; fields that are missing, not strings, or not Preeti are
/// left as they are.
pub fn convert_fields(record: &Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    let mut converted = record.clone();

    for field in fields {
        if let Some(Value::String(text)) = record.get(*field) {
            if looks_like_legacy(text) {
                converted.insert((*field).to_string(), Value::String(convert(text)));
            }
        }
    }

    converted
}

/// Typed counterpart of [`convert_fields`] for employee records.
///
/// Numeric fields in `fields` are ignored.
pub fn convert_employee(employee: &Employee, fields: &[Field]) -> Employee {
    let mut converted = employee.clone();

    for &field in fields {
        if let Some(slot) = converted.text_mut(field) {
            if looks_like_legacy(slot) {
                *slot = convert(slot);
            }
        }
    }

    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digraph_wins_over_single_glyphs() {
        // c → अ and f → ा would give "अा"
        assert_eq!(convert("cf"), "आ");
    }

    #[test]
    fn test_longest_ligature_first() {
        // "|" alone is र्, but "|m" is फ
        assert_eq!(convert("|m"), "फ");
        assert_eq!(convert("|"), "र्");
    }

    #[test]
    fn test_three_glyph_digraph_before_its_prefix() {
        assert_eq!(convert("cf]"), "ओ");
        assert_eq!(convert("cf}"), "औ");
    }

    #[test]
    fn test_header_words() {
        assert_eq!(convert("gfdy/"), "नामथर");
        assert_eq!(convert("kb"), "पद");
        assert_eq!(convert("b/"), "दर");
    }

    #[test]
    fn test_i_matra_moves_after_consonant() {
        // L is typed before s
        assert_eq!(convert("Ls"), "कि");
        assert_eq!(convert("Ltg"), "तिन");
    }

    #[test]
    fn test_i_matra_does_not_cross_line_break() {
        assert_eq!(reorder_i_matra("ि\nक"), "ि\nक");
        assert_eq!(reorder_i_matra("ि"), "ि");
        assert_eq!(reorder_i_matra("िक"), "कि");
    }

    #[test]
    fn test_digits_and_punctuation() {
        assert_eq!(convert("!@#"), "१२३");
        assert_eq!(convert("M"), "ः");
        assert_eq!(convert("•"), "।");
    }

    #[test]
    fn test_unicode_passthrough() {
        let text = "राम बहादुर";
        assert_eq!(convert(text), text);
        assert!(!looks_like_legacy(text));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "", "cf", "|m", "gfdy/", "Ls", "M", "•", "Hello", "123 ABC", "kfl/>lds s/",
            "s'n kfpg]", "ljefu\nLs", "राम", "mixed राम s",
        ];
        for sample in samples {
            let once = convert(sample);
            assert_eq!(convert(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_looks_like_legacy() {
        assert!(looks_like_legacy("gfdy/"));
        assert!(looks_like_legacy("P]"));
        assert!(looks_like_legacy("km"));
        assert!(!looks_like_legacy(""));
        assert!(!looks_like_legacy("XYZ"));
    }

    #[test]
    fn test_convert_fields_copies() {
        let record = json!({
            "name": "/fd",
            "designation": "राम",
            "tax": 120,
            "department": "XYZ"
        });
        let record = record.as_object().unwrap();
        let fields = ["name", "designation", "tax", "department", "missing"];
        let converted = convert_fields(record, &fields);

        assert_eq!(converted["name"], "राम");
        assert_eq!(converted["designation"], "राम");
        assert_eq!(converted["tax"], 120);
        assert_eq!(converted["department"], "XYZ");
        assert_eq!(record["name"], "/fd");
    }

    #[test]
    fn test_convert_employee() {
        let employee = Employee {
            name: "/fd".into(),
            pan_number: "s123".into(),
            ..Default::default()
        };
        let converted = convert_employee(&employee, &[Field::Name, Field::Tax]);

        assert_eq!(converted.name, "राम");
        assert_eq!(converted.pan_number, "s123");
        assert_eq!(employee.name, "/fd");
    }
}
