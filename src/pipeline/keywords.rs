//! Keyword extraction from analysis text.
//!
//! A plain filter, no model involved: whitespace-separated words longer than
//! four characters, minus a few stopwords, first occurrence wins.

/// Words never offered as keywords, compared case-insensitively.
pub const STOPWORDS: [&str; 10] = [
    "this", "that", "with", "from", "have", "will", "been", "were", "had", "has",
];

/// Up to `limit` distinct keywords, in order of first appearance.
///
/// Words keep their original case and punctuation, so `Cat,` and `cat`
/// are different keywords.
///
/// ```
/// use visionai::pipeline::keywords::extract_keywords;
///
/// let kw = extract_keywords("The tabby kitten sleeps. The tabby kitten purrs.", 8);
/// assert_eq!(kw, vec!["tabby", "kitten", "sleeps.", "purrs."]);
/// ```
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        if keywords.len() == limit {
            break;
        }
        if word.chars().count() <= 4 || is_stopword(word) {
            continue;
        }
        if !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}
