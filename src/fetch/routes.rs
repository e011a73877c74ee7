//! Keyword tables mapping a question to a documentation page.
//!
//! The documentation site has three sections. Reference pages carry full
//! request/response field specs, recipes walk through a workflow step by
//! step, and guides are narrative overviews.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Reference,
    Recipes,
    Guides,
}

impl Section {
    /// Precedence order: earlier sections win ties.
    pub const ALL: [Section; 3] = [Section::Reference, Section::Recipes, Section::Guides];

    pub fn path(self) -> &'static str {
        match self {
            Section::Reference => "reference",
            Section::Recipes => "recipes",
            Section::Guides => "docs",
        }
    }

    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Section::Reference => REFERENCE_PAGES,
            Section::Recipes => RECIPE_PAGES,
            Section::Guides => GUIDE_PAGES,
        }
    }

    fn weights(self) -> Weights {
        match self {
            Section::Reference => Weights {
                literal: 30,
                overlap: 15,
                inside: 8,
            },
            Section::Recipes | Section::Guides => Weights {
                literal: 20,
                overlap: 10,
                inside: 5,
            },
        }
    }
}

struct Weights {
    literal: u32,
    overlap: u32,
    inside: u32,
}

/// Added to a matched reference page when the question is about request shape.
const REFERENCE_TRIGGER_BOOST: u32 = 25;

const REFERENCE_TRIGGERS: &[&str] = &[
    "field",
    "fields",
    "parameter",
    "parameters",
    "param",
    "params",
    "request body",
    "request",
    "schema",
    "payload",
    "required",
    "format",
    "attribute",
    "attributes",
];

const REFERENCE_PAGES: &[(&str, &str)] = &[
    ("search", "post_api-hotel-search"),
    ("rooms and rates", "post_api-hotel-hotelid-roomsandrates"),
    ("roomsandrates", "post_api-hotel-hotelid-roomsandrates"),
    ("rooms", "post_api-hotel-hotelid-roomsandrates"),
    ("rates", "post_api-hotel-hotelid-roomsandrates"),
    ("rate token", "post_api-hotel-hotelid-roomsandrates-token"),
    ("price", "post_api-hotel-hotelid-price-recommendationid"),
    ("recommendation", "post_api-hotel-hotelid-price-recommendationid"),
    ("book", "post_api-hotel-booking"),
    ("booking", "post_api-hotel-booking"),
    ("cancel", "post_api-hotel-booking-bookingid-cancel"),
    ("cancellation", "post_api-hotel-booking-bookingid-cancel"),
    ("retrieve booking", "get_api-hotel-booking-bookingid"),
    ("booking details", "get_api-hotel-booking-bookingid"),
    ("static content", "post_api-hotel-static-content"),
    ("content", "post_api-hotel-static-content"),
    ("autosuggest", "get_api-hotel-autosuggest"),
    ("location", "get_api-hotel-autosuggest"),
];

const RECIPE_PAGES: &[(&str, &str)] = &[
    ("search init", "search-init"),
    ("initialize a search", "search-init"),
    ("search results", "search-results"),
    ("polling", "search-results-polling"),
    ("rooms and rates", "roomsandrates"),
    ("price by recommendation", "pricebyrecommendation"),
    ("book", "book"),
    ("booking workflow", "book"),
    ("blocking search", "blocking-search"),
    ("download content", "zentrum-connect-download-content"),
    ("download static content", "zentrum-connect-download-content"),
    ("hotel search", "zentrum-connect-hotel-search"),
    ("room rates", "zentrum-connect-room-rates"),
    ("connect price", "zentrum-connect-price"),
    ("connect book", "zentrum-connect-book"),
    ("retrieve booking", "zentrum-connect-retreive-booking"),
    ("cancel booking", "cancel-booking"),
    ("rate combinability", "zentrum-connect-rate-combinability"),
    ("combinability", "zentrum-connect-rate-combinability"),
];

const GUIDE_PAGES: &[(&str, &str)] = &[
    ("search", "search-api"),
    ("room", "roomrates-api"),
    ("rooms", "roomrates-api"),
    ("rate", "roomrates-api"),
    ("rates", "roomrates-api"),
    ("roomsandrates", "roomrates-api"),
    ("roomrates", "roomrates-api"),
    ("recommendation", "roomrates-api"),
    ("recommendations", "roomrates-api"),
    ("direct", "direct-rooms-and-rates"),
    ("book", "book-api"),
    ("booking", "book-api"),
    ("cancel", "cancel-api"),
    ("cancellation", "cancel-api"),
    ("static", "static-content-api"),
    ("content", "static-content-api"),
    ("hotel", "static-content-api"),
    ("autosuggest", "autosuggest-api"),
    ("suggest", "autosuggest-api"),
    ("location", "autosuggest-api"),
    ("price", "price-api"),
    ("pricing", "price-api"),
];

/// Guide pages whose text includes the API error-code tables.
pub const ERROR_PAGES: &[&str] = &[
    "search-api",
    "roomrates-api",
    "price-api",
    "book-api",
    "cancel-api",
];

/// The page chosen for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub section: Section,
    pub keyword: &'static str,
    pub slug: &'static str,
    pub score: u32,
}

/// Lowercase alphanumeric runs of three or more characters.
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(str::to_string)
        .collect()
}

fn keyword_score(query: &str, words: &[String], keyword: &str, weights: &Weights) -> u32 {
    let mut score = 0;
    if query.contains(keyword) {
        score += weights.literal;
    }
    let keyword_words: Vec<&str> = keyword.split_whitespace().collect();
    let overlapping = words
        .iter()
        .filter(|w| keyword_words.contains(&w.as_str()))
        .count() as u32;
    score += weights.overlap * overlapping;
    if words.iter().any(|w| keyword.contains(w.as_str())) {
        score += weights.inside;
    }
    score
}

/// Best page within one section, or `None` if no keyword scored.
pub fn best_in_section(section: Section, query: &str) -> Option<Route> {
    let query = query.to_lowercase();
    let words = query_words(&query);
    let weights = section.weights();

    let mut best: Option<Route> = None;
    for &(keyword, slug) in section.table() {
        let score = keyword_score(&query, &words, keyword, &weights);
        if score == 0 {
            continue;
        }
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Route {
                section,
                keyword,
                slug,
                score,
            });
        }
    }

    if section == Section::Reference {
        if let Some(route) = best.as_mut() {
            if REFERENCE_TRIGGERS.iter().any(|t| query.contains(t)) {
                route.score += REFERENCE_TRIGGER_BOOST;
            }
        }
    }
    best
}

/// Pick the page for a question across all sections. Higher score wins;
/// on a tie reference beats recipes beats guides.
pub fn route(query: &str) -> Option<Route> {
    let mut best: Option<Route> = None;
    for section in Section::ALL {
        if let Some(candidate) = best_in_section(section, query) {
            if best.as_ref().map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// True for questions about an error code: the word "error" or a
/// standalone 3 or 4 digit number. Digits inside ids or dates don't count.
pub fn is_error_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    if lower.contains("error") {
        return true;
    }
    lower.split_whitespace().any(|word| {
        let token = word.trim_matches(|c: char| !c.is_alphanumeric());
        (3..=4).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_digit())
    })
}

/// "cancel-api" -> "Cancel Api"
pub fn page_title(slug: &str) -> String {
    slug.split(|c| c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
