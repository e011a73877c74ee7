//! Splits a model's error explanation into summary, details and actions.

const MAX_ITEMS: usize = 5;
const MIN_SUMMARY_LEN: usize = 20;

/// Used when the model text has no recognizable action list.
pub const FALLBACK_ACTIONS: [&str; 5] = [
    "Check the error code and message in the API response",
    "Validate the request payload against the API reference",
    "Retry the request after fixing the reported issue",
    "Run a fresh search if tokens or prices may have expired",
    "Contact support with the correlationId if the error persists",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExplanation {
    pub summary: String,
    pub details: Vec<String>,
    pub recommended_actions: Vec<String>,
}

/// Text after a list marker (`-`, `*`, `•`, `1.`, `1)`), if the line is a list item.
fn list_item(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

/// Lowercased words of a heading-shaped line: markdown `#` or `**`, a
/// trailing colon, or at most three words.
fn heading_words(line: &str) -> Option<Vec<String>> {
    let marked = line.starts_with('#') || line.starts_with("**");
    let inner = line
        .trim_start_matches(['#', '*', ' '])
        .trim_end_matches(['*', ' ']);
    let colon = inner.ends_with(':');
    let words: Vec<String> = inner
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();
    (marked || colon || words.len() <= 3).then_some(words)
}

fn opens_actions(line: &str) -> bool {
    let Some(words) = heading_words(line) else {
        return false;
    };
    let lead = match words.first().map(String::as_str) {
        Some("recommended" | "next") => words.get(1).map(String::as_str),
        other => other,
    };
    matches!(lead, Some("action" | "actions" | "steps"))
}

fn opens_details(line: &str) -> bool {
    heading_words(line)
        .and_then(|w| w.first().cloned())
        .is_some_and(|w| w == "details" || w == "detail")
}

/// Strip bold markup and a leading "Summary:" label.
fn clean_summary(line: &str) -> String {
    let plain = line.replace("**", "");
    let plain = plain.trim();
    let lower = plain.to_lowercase();
    let plain = if lower.starts_with("summary") {
        plain["summary".len()..].trim_start_matches([':', ' ', '-'])
    } else {
        plain
    };
    plain.trim().to_string()
}

pub fn parse(text: &str) -> ParsedExplanation {
    let mut summary: Option<String> = None;
    let mut details = Vec::new();
    let mut actions = Vec::new();
    let mut in_actions = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(item) = list_item(line) {
            let item = item.replace("**", "");
            if item.is_empty() {
                continue;
            }
            if in_actions {
                if actions.len() < MAX_ITEMS {
                    actions.push(item);
                }
            } else if details.len() < MAX_ITEMS {
                details.push(item);
            }
            continue;
        }

        if opens_actions(line) && line.len() < 80 {
            in_actions = true;
            continue;
        }
        if opens_details(line) && line.len() < 80 {
            in_actions = false;
            continue;
        }

        if summary.is_none() && !line.starts_with('#') && line.len() > MIN_SUMMARY_LEN {
            let cleaned = clean_summary(line);
            if !cleaned.is_empty() {
                summary = Some(cleaned);
            }
        }
    }

    let summary = summary.unwrap_or_else(|| {
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .map(clean_summary)
            .unwrap_or_else(|| "No explanation was produced for this error.".to_string())
    });

    if actions.is_empty() {
        actions = FALLBACK_ACTIONS.iter().map(|a| a.to_string()).collect();
    }

    ParsedExplanation {
        summary,
        details,
        recommended_actions: actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_reply() {
        let text = "\
## Error 4004

**Summary**: Error 4004 means the selected hotel is sold out for the requested dates.

**Details**
- The inventory was taken between search and booking
- Common on popular dates
* Client error (4xxx)

**Recommended Actions**
1. Search again with different dates
2) Offer an alternative hotel
- Contact support with the correlationId if it repeats
";
        let parsed = parse(text);
        assert_eq!(
            parsed.summary,
            "Error 4004 means the selected hotel is sold out for the requested dates."
        );
        assert_eq!(parsed.details.len(), 3);
        assert_eq!(parsed.details[2], "Client error (4xxx)");
        assert_eq!(
            parsed.recommended_actions,
            vec![
                "Search again with different dates",
                "Offer an alternative hotel",
                "Contact support with the correlationId if it repeats",
            ]
        );
    }

    #[test]
    fn test_items_are_capped() {
        let mut text = String::from("This summary line is definitely long enough.\n");
        for i in 0..8 {
            text.push_str(&format!("- detail {}\n", i));
        }
        text.push_str("Next steps:\n");
        for i in 0..8 {
            text.push_str(&format!("{}. action {}\n", i + 1, i));
        }
        let parsed = parse(&text);
        assert_eq!(parsed.details.len(), 5);
        assert_eq!(parsed.recommended_actions.len(), 5);
        assert_eq!(parsed.recommended_actions[0], "action 0");
    }

    #[test]
    fn test_fallback_actions() {
        let parsed = parse("The booking failed because the rate token has expired after 30 minutes.");
        assert_eq!(parsed.recommended_actions.len(), 5);
        assert_eq!(parsed.recommended_actions[0], FALLBACK_ACTIONS[0]);
        assert!(parsed.details.is_empty());
        assert!(parsed.summary.starts_with("The booking failed"));
    }

    #[test]
    fn test_short_lines_fall_back_to_first_line() {
        let parsed = parse("# Heading\nSold out.\n");
        assert_eq!(parsed.summary, "Sold out.");
    }

    #[test]
    fn test_transaction_sentence_is_not_actions_heading() {
        let parsed = parse(
            "Error 5000: the transaction failed.\n\
             - Supplier timed out\n\
             - Upstream unavailable\n\
             Recommended actions:\n\
             - Retry later\n",
        );
        assert_eq!(parsed.summary, "Error 5000: the transaction failed.");
        assert_eq!(parsed.details, vec!["Supplier timed out", "Upstream unavailable"]);
        assert_eq!(parsed.recommended_actions, vec!["Retry later"]);
    }

    #[test]
    fn test_heading_detection() {
        assert!(opens_actions("**Recommended Actions**"));
        assert!(opens_actions("## Next steps"));
        assert!(opens_actions("Actions:"));
        assert!(!opens_actions("The transaction failed."));
        assert!(!opens_actions("Steps were skipped during the booking flow"));
        assert!(opens_details("**Details**"));
        assert!(opens_details("Details:"));
        assert!(!opens_details("A detailed log is attached."));
    }

    #[test]
    fn test_list_item_markers() {
        assert_eq!(list_item("- a"), Some("a"));
        assert_eq!(list_item("• b"), Some("b"));
        assert_eq!(list_item("12. c"), Some("c"));
        assert_eq!(list_item("3) d"), Some("d"));
        assert_eq!(list_item("4004 is sold out"), None);
        assert_eq!(list_item("-no space"), None);
    }
}
