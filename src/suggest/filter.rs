//! Candidate filtering for raw suggestion strings.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn numeric_regex() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| Regex::new(r"^[0-9.]+$").expect("Invalid regex pattern"))
}

/// Turn raw suggestions for `term` into distinct candidate terms.
///
/// Each hit such as `"okr vs kpi"` is split on `pattern`; a trailing echo of
/// the pattern word (`"okr vs"`) is removed. Empty parts, the query term
/// itself and purely numeric parts (`"2021"`, `"1.5"`) are dropped. The first
/// occurrence of a term fixes its rank.
pub fn filter_candidates<'a, I>(term: &str, pattern: &str, hits: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let echo = pattern.trim();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for hit in hits {
        for part in hit.split(pattern) {
            let mut candidate = part.trim();
            if !echo.is_empty() {
                if let Some(stripped) = candidate.strip_suffix(echo) {
                    if stripped.is_empty() || stripped.ends_with(char::is_whitespace) {
                        candidate = stripped.trim_end();
                    }
                }
            }
            if candidate.is_empty() || candidate == term || numeric_regex().is_match(candidate) {
                continue;
            }
            if seen.insert(candidate.to_string()) {
                out.push(candidate.to_string());
            }
        }
    }

    out
}
