/// The mode (most frequent item) of `types`, tie-broken by first
/// occurrence among the maximum-count items — deterministic given input
/// order, per spec.md §4.3 step 4 and §9's Open Question resolution.
#[must_use]
pub fn mode_first_occurrence(types: &[String]) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for t in types {
        if let Some(entry) = counts.iter_mut().find(|(value, _)| value == t) {
            entry.1 += 1;
        } else {
            counts.push((t.clone(), 1));
        }
    }
    let max_count = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
    counts
        .into_iter()
        .find(|(_, count)| *count == max_count)
        .map(|(value, _)| value)
        .unwrap_or_default()
}
