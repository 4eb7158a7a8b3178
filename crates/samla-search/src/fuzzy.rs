//! Client-side refinement of SQL candidates.

use crate::compile::SearchResult;

/// True when every char of `query` occurs in `target` in the same order,
/// not necessarily adjacent. Comparison is case-insensitive.
#[must_use]
pub fn subsequence_match(query: &str, target: &str) -> bool {
    let target = target.to_lowercase();
    let mut wanted = query.chars().flat_map(char::to_lowercase).peekable();

    for c in target.chars() {
        match wanted.peek() {
            Some(&w) if w == c => {
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    wanted.peek().is_none()
}

/// Substring containment or ordered subsequence, case-insensitively.
#[must_use]
pub fn fuzzy_match(query: &str, target: &str) -> bool {
    let query = query.to_lowercase();
    target.to_lowercase().contains(&query) || subsequence_match(&query, target)
}

fn matches_any_field(query: &str, result: &SearchResult) -> bool {
    [
        &result.set_name,
        &result.box_code,
        &result.box_name,
        &result.bag_serial,
        &result.location_name,
        &result.manufacturer_name,
    ]
    .into_iter()
    .chain(&result.tags)
    .any(|field| fuzzy_match(query, field))
}

/// Keep the candidates whose descriptive fields fuzzy-match `term`.
///
/// Element names are not among the checked fields, so a set found only
/// through one of its elements is dropped here. Candidate order is kept.
#[must_use]
pub fn refine(candidates: Vec<SearchResult>, term: &str) -> Vec<SearchResult> {
    let query = term.to_lowercase();
    candidates
        .into_iter()
        .filter(|result| matches_any_field(&query, result))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use samla_core::model::SetId;

    fn result(name: &str, tags: &[&str]) -> SearchResult {
        SearchResult {
            set_id: SetId::new(1),
            set_name: name.to_string(),
            manufacturer_name: String::new(),
            type_name: String::new(),
            box_code: "B1".to_string(),
            box_name: String::new(),
            bag_serial: "0001".to_string(),
            location_name: "L1".to_string(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            thumbnail_path: String::new(),
        }
    }

    #[test]
    fn test_subsequence_in_order() {
        assert!(subsequence_match("brc", "Box Code 123"));
    }

    #[test]
    fn test_subsequence_wrong_order() {
        assert!(!subsequence_match("cbr", "Box Code 123"));
    }

    #[test]
    fn test_subsequence_edge_cases() {
        assert!(subsequence_match("", "anything"));
        assert!(!subsequence_match("a", ""));
        assert!(subsequence_match("cs", "Castle Set"));
        assert!(!subsequence_match("castles", "Castle"));
    }

    #[test]
    fn test_subsequence_unicode() {
        assert!(subsequence_match("öl", "Schöner Laden"));
        assert!(subsequence_match("Ä", "äpfel"));
    }

    #[test]
    fn test_fuzzy_match_substring_case_insensitive() {
        assert!(fuzzy_match("CAS", "Castle Set"));
        assert!(!fuzzy_match("xyz", "Castle Set"));
    }

    #[test]
    fn test_refine_keeps_order_and_checks_tags() {
        let candidates = vec![
            result("Castle Set", &[]),
            result("Pirate Ship", &["harbour"]),
            result("Tower", &["castle-addon"]),
        ];
        let names: Vec<_> = refine(candidates, "cas")
            .into_iter()
            .map(|r| r.set_name)
            .collect();
        assert_eq!(names, vec!["Castle Set", "Tower"]);
    }

    #[test]
    fn test_refine_drops_unmatched() {
        let candidates = vec![result("Pirate Ship", &[])];
        assert!(refine(candidates, "zzz").is_empty());
    }
}
