use crate::keywords::KEYWORDS;

/// Length of the longest common subsequence of `a` and `b`.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut prev_diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let tmp = row[j + 1];
            row[j + 1] = if ca == cb {
                prev_diag + 1
            } else {
                row[j + 1].max(row[j])
            };
            prev_diag = tmp;
        }
    }
    row[b.len()]
}

/// Similarity ratio in `[0, 1]` between two strings, defined as twice the
/// longest-common-subsequence length over the sum of the two lengths — the
/// LCS-based analogue of the original lexer's fuzzy "did you mean"
/// suggestion (see `DESIGN.md`).
fn similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() && b_chars.is_empty() {
        return 1.0;
    }
    let lcs = lcs_len(&a_chars, &b_chars) as f64;
    2.0 * lcs / (a_chars.len() + b_chars.len()) as f64
}

/// Suggest the closest keyword to an unrecognised word, when its
/// similarity exceeds `0.5`.
pub fn suggest_keyword(word: &str) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .map(|(spelling, _)| (*spelling, similarity(word, spelling)))
        .filter(|(_, score)| *score > 0.5)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(spelling, _)| spelling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_misspelling_is_suggested() {
        assert_eq!(suggest_keyword("whlie"), Some("while"));
        assert_eq!(suggest_keyword("pgoram"), Some("program"));
    }

    #[test]
    fn unrelated_word_has_no_suggestion() {
        assert_eq!(suggest_keyword("xyzzy"), None);
    }
}
