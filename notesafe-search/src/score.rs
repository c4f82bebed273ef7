//! Per-field fuzzy match scoring.
//!
//! The point values are tuned empirically; only the relative ordering they
//! induce (substring beats subsequence, contiguous beats scattered,
//! word-boundary beats mid-word) is relied upon.

/// Base score for a contiguous substring hit.
const SUBSTRING_SCORE: i64 = 100;
/// Max bonus for a token covering a large fraction of a short field.
const COVERAGE_BONUS: i64 = 30;
/// Points per scattered subsequence character.
const CHAR_SCORE: i64 = 2;
/// Base points for a character continuing a consecutive run.
const RUN_SCORE: i64 = 5;
/// Bonus for matching at the field start or right after a separator.
const BOUNDARY_BONUS: i64 = 3;

/// Characters treated as word separators for the boundary bonus.
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '.' | '_' | '-')
}

/// Scores `token` against `field`. Both are expected pre-lowercased.
///
/// Returns 0 when the token cannot be matched as an in-order subsequence,
/// which excludes the field from ranking entirely.
pub fn fuzzy_score(field: &str, token: &str) -> i64 {
    if field.is_empty() || token.is_empty() {
        return 0;
    }

    if field.contains(token) {
        let token_len = token.chars().count() as i64;
        let field_len = field.chars().count() as i64;
        return SUBSTRING_SCORE + (COVERAGE_BONUS * token_len) / field_len;
    }

    subsequence_score(field, token)
}

/// Left-to-right subsequence scan. Consecutive matched characters score as
/// a growing run; scattered ones score flat.
fn subsequence_score(field: &str, token: &str) -> i64 {
    let field_chars: Vec<char> = field.chars().collect();

    let mut score = 0i64;
    let mut next_start = 0usize;
    let mut last_match: Option<usize> = None;
    let mut run = 0i64;

    for tc in token.chars() {
        let found = field_chars
            .iter()
            .enumerate()
            .skip(next_start)
            .find(|(_, fc)| **fc == tc)
            .map(|(i, _)| i);

        let Some(i) = found else {
            // A query character that cannot be found in order zeroes the field
            return 0;
        };

        if last_match.is_some_and(|last| i == last + 1) {
            run += 1;
            score += RUN_SCORE + run;
        } else {
            run = 1;
            score += CHAR_SCORE;
        }

        if i == 0 || is_separator(field_chars[i - 1]) {
            score += BOUNDARY_BONUS;
        }

        last_match = Some(i);
        next_start = i + 1;
    }

    score
}
