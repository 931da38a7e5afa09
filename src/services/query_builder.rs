use crate::models::{PersonaType, SearchQuery, UserInput};

/// Particles and filler words dropped from keyword extraction
const STOP_WORDS: &[&str] = &[
    "의", "을", "를", "이", "가", "은", "는", "에", "에서", "로", "으로", "와", "과", "도", "만",
    "까지", "부터", "the", "and", "for", "with", "of", "to", "in", "on",
];

/// Lowercased word tokens, without stop words or single characters
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() > 1 && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Appends the persona's search enhancement terms to the buyer's phrase
pub fn enhance_query(original_query: &str, persona: PersonaType) -> String {
    let enhancement = persona.search_enhancement();
    format!("{} {}", original_query.trim(), enhancement)
        .trim()
        .to_string()
}

pub fn build_search_query(user_input: &UserInput, persona: PersonaType) -> SearchQuery {
    let search_query = SearchQuery {
        original_query: user_input.search_query.clone(),
        enhanced_query: enhance_query(&user_input.search_query, persona),
        keywords: extract_keywords(&user_input.search_query),
        filters: user_input.filters(),
    };

    tracing::debug!(
        enhanced = %search_query.enhanced_query,
        keywords = search_query.keywords.len(),
        "Search query built"
    );

    search_query
}
