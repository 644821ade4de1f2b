use std::collections::BTreeSet;

/// Normalize a skill/requirement/tag list into set form.
///
/// Entries are trimmed and lower-cased, and empty entries are dropped.
/// Duplicates are removed. The result is sorted, so equal sets always
/// produce identical vectors.
pub fn normalize_tags<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Normalized set view, for membership tests during scoring
pub fn tag_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    normalize_tags(values).into_iter().collect()
}
