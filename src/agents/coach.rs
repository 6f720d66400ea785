//! Feedback Coaching Agent - answers free-text SOP questions
//!
//! Case-insensitive topic keywords map to rule kinds; the answer lists the
//! matching catalog rules. No session state is involved.

use crate::catalog::RuleCatalog;
use crate::types::RuleKind;

/// Returned when nothing in the question matches a topic.
pub const NOT_FOUND_RESPONSE: &str =
    "I couldn't find a specific procedure for that. Please check the SOP manual.";

/// Topic keyword → rule kinds it refers to.
const TOPICS: &[(&str, &[RuleKind])] = &[
    ("gear", &[RuleKind::GearCheck]),
    ("landing", &[RuleKind::GearCheck]),
    ("flap", &[RuleKind::FlapsTakeoff]),
    ("takeoff", &[RuleKind::FlapsTakeoff]),
];

/// Rule kinds referenced by `question`, deduplicated, in topic-table order.
pub fn match_topics(question: &str) -> Vec<RuleKind> {
    let question = question.to_lowercase();
    let mut kinds: Vec<RuleKind> = Vec::new();
    for (keyword, topic_kinds) in TOPICS {
        if question.contains(keyword) {
            for kind in *topic_kinds {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
        }
    }
    kinds
}

/// Answer a question with excerpts of the matching rules.
pub fn ask(question: &str, catalog: &RuleCatalog) -> String {
    let kinds = match_topics(question);
    let mut rules = catalog.rules_of_kinds(&kinds).peekable();
    if rules.peek().is_none() {
        return NOT_FOUND_RESPONSE.to_string();
    }

    let mut response = String::from("Here are the relevant procedures:\n");
    for rule in rules {
        response.push_str(&format!(
            "- {}: {} (Condition: {})\n",
            rule.rule_id, rule.required_action, rule.pre_condition
        ));
    }
    response
}
