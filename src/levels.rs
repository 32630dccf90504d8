//! Hierarchy level discovery from column headers.

use regex::Regex;

use crate::error::{GeneratorError, Result};
use crate::schema::HierarchyLevel;

/// Default level column pattern: an uppercase `L` followed by digits.
///
/// Anchored on purpose: the whole header must match, so `L3 Notes` or
/// `URL2` are not levels the way a substring match would make them.
pub const DEFAULT_LEVEL_PATTERN: &str = r"^L\d+$";

/// Compile a level column pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| GeneratorError::LevelPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Headers matching `pattern`, in header order. No numeric re-sorting:
/// `L1,L2,L10,L3` stays in that order.
pub fn discover_levels(headers: &[String], pattern: &Regex) -> Vec<HierarchyLevel> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| pattern.is_match(header))
        .enumerate()
        .map(|(position, (index, header))| HierarchyLevel {
            number: position + 1,
            column: header.clone(),
            index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn columns(levels: &[HierarchyLevel]) -> Vec<&str> {
        levels.iter().map(|l| l.column.as_str()).collect()
    }

    #[test]
    fn test_discovers_levels_in_header_order() {
        let pattern = compile_pattern(DEFAULT_LEVEL_PATTERN).unwrap();
        let levels = discover_levels(
            &headers(&["ID", "L1", "L2", "L3", "Content", "Control", "Values"]),
            &pattern,
        );
        assert_eq!(columns(&levels), vec!["L1", "L2", "L3"]);
        assert_eq!(levels[0].number, 1);
        assert_eq!(levels[0].index, 1);
        assert_eq!(levels[2].number, 3);
        assert_eq!(levels[2].index, 3);
    }

    #[test]
    fn test_no_numeric_resorting() {
        let pattern = compile_pattern(DEFAULT_LEVEL_PATTERN).unwrap();
        let levels = discover_levels(&headers(&["L1", "L2", "L10", "L3"]), &pattern);
        assert_eq!(columns(&levels), vec!["L1", "L2", "L10", "L3"]);
        assert_eq!(levels[2].number, 3);
    }

    #[test]
    fn test_ignores_lookalike_headers() {
        let pattern = compile_pattern(DEFAULT_LEVEL_PATTERN).unwrap();
        let levels = discover_levels(
            &headers(&["l1", "L", "Level 2", "L3 Notes", "URL2", "End Point Needed"]),
            &pattern,
        );
        assert!(levels.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = compile_pattern("L(").unwrap_err();
        assert!(matches!(err, GeneratorError::LevelPattern { .. }));
    }
}
