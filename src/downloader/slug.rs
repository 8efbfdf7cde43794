// Filesystem-safe names from video titles

use regex::Regex;

lazy_static::lazy_static! {
    static ref DISALLOWED_RE: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref UNDERSCORES_RE: Regex = Regex::new(r"_+").unwrap();
}

/// Keep Unicode word characters and hyphens, turn whitespace runs into one
/// underscore, and trim underscores from both ends.
///
/// "Aula 01: Introdução!" becomes "Aula_01_Introdução".
/// The result may be empty when the title has no word characters.
pub fn slugify(text: &str) -> String {
    let kept = DISALLOWED_RE.replace_all(text, "");
    let joined = WHITESPACE_RE.replace_all(kept.trim(), "_");
    let collapsed = UNDERSCORES_RE.replace_all(&joined, "_");
    collapsed.trim_matches('_').to_string()
}
