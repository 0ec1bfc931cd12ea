//! Fuzzy lookup over resolved field names.
//!
//! Field names are unpredictable OCR output, so lookups match a pattern
//! anywhere in the name (case-insensitive) instead of requiring exact keys.

use regex::RegexBuilder;

use fieldfare_core::error::{FieldfareError, Result};

use crate::resolver::FieldMap;

/// Find the values of the first field whose name matches `pattern`.
///
/// The pattern is compiled case-insensitively and matched anywhere in the
/// field name as written: `"reviewid"` matches a field named `"ReviewID"`
/// but not `"Review ID"`. "First" follows the map's insertion order.
/// Returns `Ok(None)` when nothing matches; an invalid pattern is a
/// configuration error.
pub fn find_values<'a>(fields: &'a FieldMap, pattern: &str) -> Result<Option<&'a Vec<String>>> {
    let matcher = build_matcher(pattern)?;
    Ok(fields
        .iter()
        .find(|(name, _)| matcher.is_match(name))
        .map(|(_, values)| values))
}

/// Every matching field's name and values, in map order.
pub fn find_all_values<'a>(
    fields: &'a FieldMap,
    pattern: &str,
) -> Result<Vec<(&'a str, &'a Vec<String>)>> {
    let matcher = build_matcher(pattern)?;
    Ok(fields
        .iter()
        .filter(|(name, _)| matcher.is_match(name))
        .map(|(name, values)| (name.as_str(), values))
        .collect())
}

fn build_matcher(pattern: &str) -> Result<regex::Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FieldfareError::Config(format!("Invalid field pattern '{}': {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("ReviewID".to_string(), vec!["4821".to_string()]);
        fields.insert(
            "reviewBody".to_string(),
            vec!["Great battery life".to_string()],
        );
        fields.insert("Review ID".to_string(), vec!["spaced".to_string()]);
        fields
    }

    #[test]
    fn test_find_values_case_insensitive() {
        let fields = sample_fields();
        let values = find_values(&fields, "reviewid").unwrap().unwrap();
        assert_eq!(values, &vec!["4821".to_string()]);
    }

    #[test]
    fn test_find_values_whitespace_matters() {
        let mut fields = FieldMap::new();
        fields.insert("Review ID".to_string(), vec!["spaced".to_string()]);
        // "reviewid" has no space, "Review ID" does: no match.
        assert_eq!(find_values(&fields, "reviewid").unwrap(), None);
    }

    #[test]
    fn test_find_values_substring_match() {
        let fields = sample_fields();
        let values = find_values(&fields, "body").unwrap().unwrap();
        assert_eq!(values, &vec!["Great battery life".to_string()]);
    }

    #[test]
    fn test_find_values_first_match_by_insertion_order() {
        let mut fields = FieldMap::new();
        fields.insert("Review Score".to_string(), vec!["5".to_string()]);
        fields.insert("Review Date".to_string(), vec!["2023-06-14".to_string()]);
        // Both names contain "review"; the earlier insertion wins.
        let values = find_values(&fields, "review").unwrap().unwrap();
        assert_eq!(values, &vec!["5".to_string()]);
    }

    #[test]
    fn test_find_values_no_match() {
        let fields = sample_fields();
        assert_eq!(find_values(&fields, "zipcode").unwrap(), None);
    }

    #[test]
    fn test_find_values_empty_map() {
        let fields = FieldMap::new();
        assert_eq!(find_values(&fields, "anything").unwrap(), None);
    }

    #[test]
    fn test_find_values_invalid_pattern() {
        let fields = sample_fields();
        let err = find_values(&fields, "review[").unwrap_err();
        assert!(matches!(err, FieldfareError::Config(_)));
    }

    #[test]
    fn test_find_all_values_returns_every_match() {
        let fields = sample_fields();
        let matches = find_all_values(&fields, "review").unwrap();
        let names: Vec<&str> = matches.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["ReviewID", "reviewBody", "Review ID"]);
    }

    #[test]
    fn test_find_all_values_no_match() {
        let fields = sample_fields();
        assert!(find_all_values(&fields, "zipcode").unwrap().is_empty());
    }
}
