//! Lexical relevance scoring of a query against knowledge-base documents.

use super::types::Document;

const KEY_MATCH: u32 = 15;
const TITLE_MATCH: u32 = 10;
const TOKEN_HIT: u32 = 2;
const PHRASE_HIT: u32 = 20;
const CANCEL_BOOST: u32 = 25;

/// Canonical document that must win any field-definition question.
pub const FIELD_DEFINITIONS_KEY: &str = "field_definitions";

const FIELD_TRIGGERS: &[&str] = &[
    "field definition",
    "field definitions",
    "define field",
    "field meaning",
    "fields mean",
    "field mean",
    "what is the field",
    "what does the field",
    "field description",
    "field descriptions",
    "meaning of field",
];

const BOOKING_FLOW_TRIGGERS: &[&str] = &[
    "booking workflow",
    "booking flow",
    "booking process",
    "booking journey",
];

const SEARCH_FLOW_TRIGGERS: &[&str] = &["search workflow", "search flow", "search process"];

const CANCEL_FLOW_TRIGGERS: &[&str] = &[
    "cancellation workflow",
    "cancellation flow",
    "cancel workflow",
    "cancel flow",
];

const GENERAL_FLOW_TRIGGERS: &[&str] = &[
    "end to end",
    "end-to-end",
    "complete workflow",
    "integration flow",
    "step by step",
];

/// Which document keys an override rule applies to.
#[derive(Debug, Clone, Copy)]
pub enum KeyMatch {
    Equals(&'static str),
    /// Key contains any needle, except the listed key.
    ContainsAnyExcept {
        needles: &'static [&'static str],
        except: &'static str,
    },
}

impl KeyMatch {
    fn matches(&self, key: &str) -> bool {
        match *self {
            KeyMatch::Equals(target) => key == target,
            KeyMatch::ContainsAnyExcept { needles, except } => {
                key != except && needles.iter().any(|n| key.contains(n))
            }
        }
    }
}

/// Hard priority boost: when the query contains any trigger phrase,
/// documents whose key matches `target` get `boost` added.
#[derive(Debug, Clone, Copy)]
pub struct OverrideRule {
    pub triggers: &'static [&'static str],
    pub target: KeyMatch,
    pub boost: u32,
}

impl OverrideRule {
    fn applies(&self, query: &str, key: &str) -> bool {
        self.target.matches(key) && self.triggers.iter().any(|t| query.contains(t))
    }
}

/// Rules evaluated in order after base scoring. Boosts are additive.
pub const OVERRIDE_RULES: &[OverrideRule] = &[
    OverrideRule {
        triggers: FIELD_TRIGGERS,
        target: KeyMatch::Equals(FIELD_DEFINITIONS_KEY),
        boost: 1000,
    },
    OverrideRule {
        triggers: FIELD_TRIGGERS,
        target: KeyMatch::ContainsAnyExcept {
            needles: &["field", "definition"],
            except: FIELD_DEFINITIONS_KEY,
        },
        boost: 500,
    },
    OverrideRule {
        triggers: BOOKING_FLOW_TRIGGERS,
        target: KeyMatch::Equals("booking_workflow"),
        boost: 1000,
    },
    OverrideRule {
        triggers: SEARCH_FLOW_TRIGGERS,
        target: KeyMatch::Equals("search_workflow"),
        boost: 1000,
    },
    OverrideRule {
        triggers: CANCEL_FLOW_TRIGGERS,
        target: KeyMatch::Equals("cancellation_workflow"),
        boost: 1000,
    },
    OverrideRule {
        triggers: GENERAL_FLOW_TRIGGERS,
        target: KeyMatch::Equals("complete_workflow"),
        boost: 1000,
    },
];

/// Lowercased text a query is matched against.
pub fn searchable_text(doc: &Document) -> String {
    let mut text = String::new();
    text.push_str(&doc.key);
    text.push('\n');
    text.push_str(&doc.title);
    text.push('\n');
    if let Some(desc) = &doc.description {
        text.push_str(desc);
        text.push('\n');
    }
    text.push_str(&doc.body.text());
    text.to_lowercase()
}

/// Score a document with the default override rules.
pub fn score(query: &str, doc: &Document) -> u32 {
    score_with_rules(query, doc, OVERRIDE_RULES)
}

pub fn score_with_rules(query: &str, doc: &Document, rules: &[OverrideRule]) -> u32 {
    let query = query.trim().to_lowercase();
    let tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.is_empty() {
        return 0;
    }

    let key = doc.key.to_lowercase();
    let title = doc.title.to_lowercase();
    let text = searchable_text(doc);

    let overlaps = |field: &str| {
        tokens
            .iter()
            .any(|t| field.contains(t) || t.contains(field))
    };

    let mut total = 0;
    if overlaps(&key) {
        total += KEY_MATCH;
    }
    if overlaps(&title) {
        total += TITLE_MATCH;
    }
    total += TOKEN_HIT * tokens.iter().filter(|t| text.contains(*t)).count() as u32;
    if text.contains(query.as_str()) {
        total += PHRASE_HIT;
    }
    if query.contains("cancel") && text.contains("cancel") {
        total += CANCEL_BOOST;
    }

    if total == 0 {
        return 0;
    }

    for rule in rules {
        if rule.applies(&query, &key) {
            total += rule.boost;
        }
    }
    total
}
