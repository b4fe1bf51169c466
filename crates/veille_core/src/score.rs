//! Keyword-based relevance scoring.
//!
//! The score is a pure function of (title, body, keyword set): recomputing it
//! over the same text always yields the same value, so keyword-set changes
//! can be retro-applied to stored articles without re-scraping.

use serde::{Deserialize, Serialize};

use crate::text::normalize;

/// A named group of term phrases sharing one weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub terms: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordSet {
    pub groups: Vec<KeywordGroup>,
}

impl KeywordSet {
    /// The stock election keyword set used when no keyword file is supplied.
    pub fn default_election() -> Self {
        KeywordSet {
            groups: vec![KeywordGroup {
                name: "election".to_string(),
                weight: 1.0,
                terms: [
                    "élection",
                    "électoral",
                    "scrutin",
                    "vote",
                    "candidat",
                    "candidature",
                    "bureau de vote",
                    "bureaux de vote",
                    "CENI",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.terms.is_empty())
    }
}

/// Counts non-overlapping occurrences of `needle` in `haystack`.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Weighted keyword occurrence count over title + body. Matching is
/// case-insensitive and diacritic-insensitive; multi-word phrases are
/// matched as written (e.g. "bureau de vote").
pub fn relevance(title: &str, content: &str, keywords: &KeywordSet) -> f64 {
    let text = normalize(&format!("{} {}", title, content));
    let mut total = 0.0;

    for group in &keywords.groups {
        for term in &group.terms {
            let needle = normalize(term);
            total += count_occurrences(&text, &needle) as f64 * group.weight;
        }
    }

    total
}

/// Terms of the keyword set found at least once in the text.
pub fn matched_terms(title: &str, content: &str, keywords: &KeywordSet) -> Vec<String> {
    let text = normalize(&format!("{} {}", title, content));
    let mut found = Vec::new();
    for group in &keywords.groups {
        for term in &group.terms {
            if count_occurrences(&text, &normalize(term)) > 0 {
                found.push(term.clone());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "La CENI a annoncé le calendrier électoral... Le scrutin... \
candidats... candidature... bureaux de vote... Le vote...";

    #[test]
    fn test_default_set_scores_sample_at_nine() {
        let score = relevance(SAMPLE, "", &KeywordSet::default_election());
        assert_eq!(score, 9.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let keywords = KeywordSet::default_election();
        let first = relevance(SAMPLE, "corps du texte", &keywords);
        for _ in 0..10 {
            assert_eq!(relevance(SAMPLE, "corps du texte", &keywords), first);
        }
    }

    #[test]
    fn test_diacritic_insensitive_matching() {
        let keywords = KeywordSet::default_election();
        // Unaccented rendition of "élection électorale".
        let accentless = relevance("election electorale", "", &keywords);
        let accented = relevance("élection électorale", "", &keywords);
        assert_eq!(accentless, accented);
        assert!(accented >= 2.0);
    }

    #[test]
    fn test_multi_word_phrase_counting() {
        let keywords = KeywordSet {
            groups: vec![KeywordGroup {
                name: "election".into(),
                weight: 1.0,
                terms: vec!["bureau de vote".into()],
            }],
        };
        // "vote" on its own is not enough for the phrase.
        assert_eq!(relevance("le vote est ouvert", "", &keywords), 0.0);
        assert_eq!(
            relevance("chaque bureau de vote ouvre, un bureau de vote ferme", "", &keywords),
            2.0
        );
    }

    #[test]
    fn test_group_weights() {
        let keywords = KeywordSet {
            groups: vec![
                KeywordGroup {
                    name: "election".into(),
                    weight: 2.0,
                    terms: vec!["scrutin".into()],
                },
                KeywordGroup {
                    name: "acteurs".into(),
                    weight: 0.5,
                    terms: vec!["ministre".into()],
                },
            ],
        };
        assert_eq!(relevance("le scrutin et le ministre", "", &keywords), 2.5);
    }

    #[test]
    fn test_matched_terms() {
        let found = matched_terms(SAMPLE, "", &KeywordSet::default_election());
        assert!(found.contains(&"CENI".to_string()));
        assert!(found.contains(&"scrutin".to_string()));
        assert!(!found.contains(&"bureau de vote".to_string()));
    }
}
