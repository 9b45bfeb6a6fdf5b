//! Input validation ahead of the search core.
//!
//! Search assumes a well-formed [`SearchQuery`]; the CLI and importers run
//! the checks here first. Product statuses go through the same three-tier
//! resolution as elsewhere: exact match, then synonym, then an error with
//! the closest suggestion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::model::ProductStatus;
use crate::search::{SearchQuery, SortSpec};

// ── Valid value sets ─────────────────────────────────────────

pub static VALID_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["active", "draft", "archived"].into_iter().collect());

pub static VALID_SORT_FIELDS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
    ["createdAt", "title", "price", "rating", "stock", "similarity"]
        .into_iter()
        .collect()
});

// ── Synonym maps ─────────────────────────────────────────────

pub static STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("published", "active"),
        ("live", "active"),
        ("enabled", "active"),
        ("visible", "active"),
        ("available", "active"),
        ("unpublished", "draft"),
        ("hidden", "draft"),
        ("pending", "draft"),
        ("disabled", "draft"),
        ("discontinued", "archived"),
        ("retired", "archived"),
        ("deleted", "archived"),
    ]
    .into_iter()
    .collect()
});

/// Normalize a product status via exact match or synonym lookup.
///
/// Returns the canonical status, or the original input and an optional
/// suggestion.
pub fn normalize_status(input: &str) -> std::result::Result<ProductStatus, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    if VALID_STATUSES.contains(lower.as_str()) {
        return Ok(ProductStatus::from_stored(&lower));
    }

    if let Some(&canonical) = STATUS_SYNONYMS.get(lower.as_str()) {
        return Ok(ProductStatus::from_stored(canonical));
    }

    let suggestion = find_closest_match(&lower, &VALID_STATUSES, &STATUS_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Reject queries the search core should never see.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for page 0, a rating outside 0..=5,
/// negative or non-finite prices, or `min_price > max_price`.
pub fn validate_search_query(query: &SearchQuery) -> Result<()> {
    if query.page == 0 {
        return Err(Error::InvalidArgument("page must be at least 1".into()));
    }

    if let Some(rating) = query.rating {
        if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
            return Err(Error::InvalidArgument(format!(
                "rating must be between 0 and 5, got {rating}"
            )));
        }
    }

    for (name, value) in [("min_price", query.min_price), ("max_price", query.max_price)] {
        if let Some(price) = value {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "{name} must be a non-negative number, got {price}"
                )));
            }
        }
    }

    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(Error::InvalidArgument(format!(
                "min_price ({min}) is greater than max_price ({max})"
            )));
        }
    }

    Ok(())
}

/// Suggest a correction for a sort parameter that will be ignored.
///
/// Returns `None` when `raw` parses, or when nothing is close enough.
#[must_use]
pub fn suggest_sort(raw: &str) -> Option<String> {
    if raw.parse::<SortSpec>().is_ok() {
        return None;
    }
    let (field, direction) = raw.split_once('.').unwrap_or((raw, "desc"));
    let direction = if direction.eq_ignore_ascii_case("asc") { "asc" } else { "desc" };

    VALID_SORT_FIELDS
        .iter()
        .map(|candidate| (levenshtein_distance(&field.to_lowercase(), &candidate.to_lowercase()), *candidate))
        .filter(|(dist, _)| *dist <= 3)
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, candidate)| format!("{candidate}.{direction}"))
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status("active"), Ok(ProductStatus::Active));
        assert_eq!(normalize_status("Published"), Ok(ProductStatus::Active));
        assert_eq!(normalize_status("hidden"), Ok(ProductStatus::Draft));
        assert_eq!(normalize_status("retired"), Ok(ProductStatus::Archived));

        let (input, suggestion) = normalize_status("activ").unwrap_err();
        assert_eq!(input, "activ");
        assert_eq!(suggestion.as_deref(), Some("active"));
        assert!(normalize_status("zzzzzzzzzz").unwrap_err().1.is_none());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(validate_search_query(&SearchQuery::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let cases = [
            SearchQuery { page: 0, ..SearchQuery::default() },
            SearchQuery { rating: Some(5.5), ..SearchQuery::default() },
            SearchQuery { min_price: Some(-1.0), ..SearchQuery::default() },
            SearchQuery { max_price: Some(f64::NAN), ..SearchQuery::default() },
            SearchQuery { min_price: Some(20.0), max_price: Some(10.0), ..SearchQuery::default() },
        ];
        for query in cases {
            assert!(
                matches!(validate_search_query(&query), Err(Error::InvalidArgument(_))),
                "{query:?}"
            );
        }
    }

    #[test]
    fn test_suggest_sort() {
        assert_eq!(suggest_sort("price.asc"), None);
        assert_eq!(suggest_sort("prise.asc").as_deref(), Some("price.asc"));
        assert_eq!(suggest_sort("created_at.desc").as_deref(), Some("createdAt.desc"));
        assert_eq!(suggest_sort("zzzzzzzzzz"), None);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }
}
