use crate::catalog::Catalog;
use crate::models::{Action, Intent, Urgency};

/// Trigger words per action, checked top to bottom; the first hit wins.
const ACTION_PATTERNS: &[(Action, &[&str])] = &[
    (Action::Deploy, &["deploy", "push", "release", "ship"]),
    (Action::Fix, &["fix", "bug", "issue", "problem", "error"]),
    (
        Action::Enhance,
        &["enhance", "improve", "feature", "upgrade", "optimize"],
    ),
    (Action::Test, &["test", "verify", "qa"]),
    (Action::Docs, &["docs", "document", "readme"]),
    (Action::Review, &["review", "audit", "security"]),
    (Action::Monitor, &["monitor", "status", "health", "check"]),
];

const URGENCY_WORDS: &[&str] = &["urgent", "asap"];

/// Read a mention into an [`Intent`]. Total: text with no signals yields a
/// fully defaulted intent.
pub fn classify(catalog: &Catalog, mention: &str) -> Intent {
    let hay = mention.to_lowercase();

    let products = catalog
        .products
        .iter()
        .filter(|entry| hay.contains(entry.product.as_str()))
        .map(|entry| entry.product.clone())
        .collect();

    let infra_refs = catalog
        .infra_nodes
        .iter()
        .filter(|node| hay.contains(node.as_str()))
        .cloned()
        .collect();

    let urgency = if has_any(&hay, URGENCY_WORDS) {
        Urgency::Urgent
    } else {
        Urgency::Normal
    };

    Intent {
        products,
        action: detect_action(&hay),
        infra_refs,
        urgency,
        raw_text: mention.to_string(),
    }
}

fn detect_action(hay: &str) -> Action {
    ACTION_PATTERNS
        .iter()
        .find(|(_, words)| has_any(hay, words))
        .map(|(action, _)| *action)
        .unwrap_or(Action::General)
}

pub(crate) fn has_any(s: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| s.contains(t))
}
