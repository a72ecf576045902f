//! Advisory near-duplicate detector for task entry.
//!
//! Compares a candidate's title and description against every open task
//! using a case-insensitive normalized edit-distance ratio, computed
//! independently per field (the two scores are never combined). The caller
//! decides whether to proceed despite a match.

/// Similarity threshold the task-entry flow uses.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// One open task reported as a likely duplicate of the candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub title: String,
    pub description: String,
    pub title_score: f64,
    pub description_score: f64,
}

/// Scan `open_tasks` (title, description pairs) for near-duplicates of the
/// candidate.
///
/// A task is reported when either field's similarity reaches `threshold`.
/// An empty candidate description short-circuits the whole check — minimal
/// entries would otherwise flood the report with false positives. Results
/// preserve the order of `open_tasks`.
pub fn find_duplicates(
    candidate_title: &str,
    candidate_description: &str,
    open_tasks: &[(String, String)],
    threshold: f64,
) -> Vec<DuplicateMatch> {
    if candidate_description.is_empty() {
        return Vec::new();
    }
    let mut matches = Vec::new();
    for (title, description) in open_tasks {
        let title_score = similarity(candidate_title, title);
        let description_score = similarity(candidate_description, description);
        if title_score >= threshold || description_score >= threshold {
            matches.push(DuplicateMatch {
                title: title.clone(),
                description: description.clone(),
                title_score,
                description_score,
            });
        }
    }
    matches
}

/// Case-insensitive similarity ratio in [0,1]: `1 - levenshtein / max_len`.
/// Two empty strings are identical (ratio 1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
