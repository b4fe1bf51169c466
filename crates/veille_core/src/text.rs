//! Text normalization, summaries and derived identifiers.

use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters stripped before link comparison/hashing.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "fbclid",
    "gclid",
    "ref",
    "source",
];

/// Replaces accented characters with their base letter. Covers the French
/// repertoire the sources publish in.
pub fn fold_diacritics(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' | 'ì' => 'i',
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ÿ' | 'ý' => 'y',
            'ç' => 'c',
            'ñ' => 'n',
            'À' | 'Â' | 'Ä' | 'Á' | 'Ã' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Î' | 'Ï' | 'Í' | 'Ì' => 'I',
            'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => 'O',
            'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
            'Ç' => 'C',
            'Ñ' => 'N',
            _ => c,
        })
        .collect()
}

/// Lowercases, folds diacritics and collapses whitespace. This is the form
/// keyword matching runs against.
pub fn normalize(text: &str) -> String {
    collapse_whitespace(&fold_diacritics(&text.to_lowercase()))
}

pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Bounded-length extract of the body text. Cuts at the last word boundary
/// before the limit when that boundary is not too far back, and marks
/// truncation with an ellipsis. The ellipsis counts against `max_len`, so
/// the result never exceeds it.
pub fn summarize(content: &str, max_len: usize) -> String {
    let text = collapse_whitespace(content);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text;
    }

    let budget = max_len.saturating_sub(3);
    let mut cut = budget;
    if let Some(pos) = chars[..budget].iter().rposition(|c| *c == ' ') {
        // Keep whole words unless the last space is before 70% of the budget.
        if pos * 10 >= budget * 7 {
            cut = pos;
        }
    }

    let mut summary: String = chars[..cut].iter().collect();
    while summary.ends_with(' ') {
        summary.pop();
    }
    summary.push_str("...");
    summary
}

/// Canonical form of an article link: no fragment, no tracking parameters,
/// no trailing slash. The derived identifier is computed over this form so
/// that reprocessing the same URL always yields the same guid.
pub fn normalize_link(link: &str) -> String {
    let trimmed = link.trim();
    let mut url = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => return trimmed.to_string(),
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| {
            let k = k.to_lowercase();
            !TRACKING_PARAMS.contains(&k.as_str()) && !k.starts_with("utm_")
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        url.set_query(Some(&query));
    }

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    url.to_string()
}

/// Stable identifier for an article, derived from its normalized link.
pub fn guid_from_link(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_link(link).as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold_diacritics("élection référendum"), "election referendum");
        assert_eq!(fold_diacritics("Guinée"), "Guinee");
        assert_eq!(fold_diacritics("no accents"), "no accents");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Élection   PRÉSIDENTIELLE \n"), "election presidentielle");
    }

    #[test]
    fn test_summarize_short_text_untouched() {
        assert_eq!(summarize("Un court texte.", 300), "Un court texte.");
    }

    #[test]
    fn test_summarize_respects_max_length() {
        let body = "mot ".repeat(200);
        let summary = summarize(&body, 300);
        // The ellipsis is part of the limit, not on top of it.
        assert!(summary.chars().count() <= 300);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summarize_never_exceeds_limit_without_word_boundary() {
        let body = "x".repeat(500);
        let summary = summarize(&body, 300);
        assert_eq!(summary.chars().count(), 300);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summarize_cuts_on_word_boundary() {
        let body = "La commission électorale a publié le calendrier des opérations de vote pour le scrutin présidentiel";
        let summary = summarize(body, 40);
        // No word is split in half.
        let without_ellipsis = summary.trim_end_matches("...");
        assert!(body.starts_with(without_ellipsis));
        assert!(body.as_bytes().get(without_ellipsis.len()) == Some(&b' '));
    }

    #[test]
    fn test_normalize_link_strips_tracking_and_fragment() {
        let link = "https://guineenews.org/article-test/?utm_source=x&utm_campaign=y&id=3#section";
        assert_eq!(
            normalize_link(link),
            "https://guineenews.org/article-test?id=3"
        );
    }

    #[test]
    fn test_normalize_link_trailing_slash() {
        assert_eq!(
            normalize_link("https://ledjely.com/2026/01/12/titre/"),
            "https://ledjely.com/2026/01/12/titre"
        );
    }

    #[test]
    fn test_guid_is_stable() {
        // Known vector: sha-256 of the normalized link below.
        assert_eq!(
            guid_from_link("https://guineenews.org/politique/exemple-article"),
            "bc04659bbe6b44581fed18a29e54db69855ec417e1a892d011f500f5d8631834"
        );
        // Tracking params do not change the identifier.
        assert_eq!(
            guid_from_link("https://guineenews.org/politique/exemple-article?utm_source=t"),
            guid_from_link("https://guineenews.org/politique/exemple-article/"),
        );
    }
}
