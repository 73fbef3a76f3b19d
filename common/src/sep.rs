//! The `<SEP>` field separator used throughout the graph for packing
//! multi-valued string fields (descriptions, source IDs) into one column.
//! See spec.md §6 "Field separator".

pub const SEP: &str = "<SEP>";

/// Splits a `<SEP>`-joined field back into its components, dropping empty
/// segments (an empty existing field splits to zero elements, not one).
#[must_use]
pub fn split(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(SEP).map(str::to_owned).collect()
}

/// Joins components with `<SEP>`.
#[must_use]
pub fn join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|s| s.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(SEP)
}

/// Appends `value` to `existing` (order-preserving) if not already present.
pub fn push_unique(existing: &mut Vec<String>, value: String) {
    if !existing.iter().any(|v| v == &value) {
        existing.push(value);
    }
}
