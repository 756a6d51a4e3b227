//! Preeti glyph tables.
//!
//! Three tiers, applied in this order: ligatures, digraphs, single
//! characters. Within a tier, longer patterns always run first.

/// Multi-glyph ligatures and conjuncts.
pub(super) const LIGATURES: &[(&str, &str)] = &[
    ("\\", "ू"),
    ("Ø", "क्र"),
    ("|m", "फ"),
    ("|", "र्"),
    ("^", "६"),
    ("ß", "द्व"),
    ("Î", "द्य"),
    ("å", "द्ध"),
    ("›", "दृ"),
    ("ê", "क्त"),
    ("‹", "ट्ट"),
    ("Ý", "ट्ठ"),
    ("ç", "न्न"),
    ("í", "न्ह"),
    ("ì", "ह्न"),
    ("Í", "ड्ड"),
    ("Ë", "ड्ढ"),
    ("§", "ञ्ज"),
    ("‰", "ट्र"),
    ("Ú", "ठ्ठ"),
    ("é", "ड्र"),
    ("ë", "ढ्य"),
    ("Ò", "द्घ"),
    ("ƒ", "ह्य"),
    ("‡", "द्द"),
    ("N", "ल"),
    ("•", "."),
];

/// Independent vowels, vowel-sign pairs and compound consonants.
pub(super) const DIGRAPHS: &[(&str, &str)] = &[
    ("cf", "आ"),
    ("O{", "ई"),
    ("pm", "ऊ"),
    ("P]", "ऐ"),
    ("cf]", "ओ"),
    ("cf}", "औ"),
    ("em", "झ"),
    ("km", "फ"),
    ("if", "ष"),
    ("If", "क्ष"),
    ("f]", "ो"),
    ("f}", "ौ"),
];

/// Single-glyph substitution.
pub(super) fn single(c: char) -> Option<&'static str> {
    let mapped = match c {
        // vowels
        'c' => "अ",
        'O' => "इ",
        'p' => "उ",
        'P' => "ए",
        'C' => "ऋ",
        // consonants
        's' => "क",
        'v' => "ख",
        'u' => "ग",
        '3' => "घ",
        'ª' => "ङ",
        'r' => "च",
        '5' => "छ",
        'h' => "ज",
        '`' => "ञ",
        '6' => "ट",
        '7' => "ठ",
        '8' => "ड",
        '9' => "ढ",
        '0' => "ण",
        't' => "त",
        'y' => "थ",
        'b' => "द",
        'w' => "ध",
        'g' => "न",
        'k' => "प",
        'a' => "ब",
        'e' => "भ",
        'd' => "म",
        'o' => "य",
        '/' => "र",
        'n' => "ल",
        'j' => "व",
        'z' => "श",
        ';' => "स",
        'x' => "ह",
        'q' => "त्र",
        '1' => "ज्ञ",
        // vowel signs
        'f' => "ा",
        'L' => "ि",
        'l' => "ी",
        'F' => "ी",
        ']' => "े",
        '}' => "ै",
        '[' => "ु",
        '{' => "ू",
        '\'' => "ृ",
        // digits
        ')' => "०",
        '!' => "१",
        '@' => "२",
        '#' => "३",
        '$' => "४",
        '%' => "५",
        '&' => "७",
        '*' => "८",
        '(' => "९",
        // punctuation
        '.' => "।",
        ':' => "ः",
        'M' => "ः",
        _ => return None,
    };
    Some(mapped)
}
