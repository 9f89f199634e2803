//! "Did you mean" suggestions for unknown topic names
//!
//! Case-insensitive Levenshtein distance with an early cutoff. A name is
//! suggested when it is within `max(2, len / 3)` edits of the request.

/// Names from `candidates` close enough to `target`, nearest first
pub fn similar_names<'a, I>(candidates: I, target: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle: Vec<char> = target.to_lowercase().chars().collect();
    let max_dist = (needle.len() / 3).max(2);

    let mut matches: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter(|name| *name != target)
        .filter_map(|name| {
            let dist = levenshtein_with_max(&name.to_lowercase(), &needle, max_dist);
            (dist <= max_dist).then_some((dist, name))
        })
        .collect();

    matches.sort();
    matches.dedup();
    matches.into_iter().map(|(_, name)| name.to_string()).collect()
}

/// Edit distance, or any value above `max_dist` once it is out of reach
fn levenshtein_with_max(value: &str, needle: &[char], max_dist: usize) -> usize {
    let n = needle.len();
    if n == 0 {
        return value.chars().count();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = if c == needle[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }

        if row_min > max_dist {
            return max_dist + 1;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
