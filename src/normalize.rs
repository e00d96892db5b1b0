use std::collections::BTreeSet;

use crate::models::ShiftRecord;

/// Canonical matching key for a courier name: lowercased, diacritics folded
/// to ASCII, surrounding whitespace trimmed. Names arrive from the
/// spreadsheet with inconsistent casing and accents, so every lookup goes
/// through this before touching shift data.
pub fn normalize_name(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter_map(fold_ascii)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Maps an accented lowercase letter to its ASCII base letter. Characters
/// outside ASCII that have no mapping are dropped entirely.
fn fold_ascii(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        c if c.is_ascii() => c,
        _ => return None,
    };
    Some(folded)
}

/// Distinct courier display names present in the table, sorted. Feeds the
/// `couriers` listing and fuzzy resolution of free-typed names.
pub fn courier_names(records: &[ShiftRecord]) -> Vec<String> {
    let names: BTreeSet<&str> = records
        .iter()
        .map(|r| r.courier_name.as_str())
        .filter(|n| !n.trim().is_empty())
        .collect();
    names.into_iter().map(str::to_string).collect()
}

/// Nearest candidate to `input` by similarity of normalized forms, or None
/// when nothing scores at or above `cutoff` (0.0..=1.0). An exact key match
/// always wins.
pub fn closest_match<'a>(input: &str, candidates: &'a [String], cutoff: f64) -> Option<&'a str> {
    let wanted = normalize_name(input);
    if wanted.is_empty() {
        return None;
    }

    let mut best: Option<(f64, &str)> = None;
    for candidate in candidates {
        let key = normalize_name(candidate);
        if key == wanted {
            return Some(candidate);
        }
        let score = similarity(&wanted, &key);
        if score >= cutoff && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, name)| name)
}

/// Similarity ratio in 0.0..=1.0 based on edit distance.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}
