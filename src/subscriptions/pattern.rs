//! Subscription pattern matching and stored-query validation (§4.4).

use crate::error::{GraphError, Result};
use crate::model::{Event, SubscriptionPattern};

/// Keywords that would let a "read-only" stored query mutate the graph;
/// rejected at registration time (§4.4, "Stored query safety").
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "CREATE", "DELETE", "SET", "REMOVE", "MERGE", "DETACH", "DROP", "CALL",
];

/// A stored query must contain both `MATCH` and `RETURN` and none of the
/// write keywords, checked case-insensitively as a plain substring match
/// (§4.4 step 1): a query containing `created_at` is rejected just as one
/// containing `CREATE TABLE` would be, since the spec draws no distinction
/// between a keyword and a keyword embedded in a longer identifier.
pub fn validate_stored_query(query: &str) -> Result<()> {
    let upper = query.to_uppercase();

    for forbidden in FORBIDDEN_KEYWORDS {
        if upper.contains(forbidden) {
            return Err(GraphError::ForbiddenQuery(format!(
                "stored query must not contain '{forbidden}'"
            )));
        }
    }
    if !upper.contains("MATCH") || !upper.contains("RETURN") {
        return Err(GraphError::ForbiddenQuery(
            "stored query must contain both MATCH and RETURN".into(),
        ));
    }
    Ok(())
}

/// Whether `event` satisfies `pattern`'s simple criteria. `stored_query`
/// evaluation happens separately against the storage driver (§4.5); this
/// only covers the cheap, storage-independent checks.
pub fn matches_simple_criteria(pattern: &SubscriptionPattern, event: &Event) -> bool {
    if !pattern.event_types.is_empty() && !pattern.event_types.contains(&event.event_type) {
        return false;
    }

    if event.event_type.is_node_event() {
        if !pattern.node_types.is_empty() {
            let Some(node_type) = &event.node_type else {
                return false;
            };
            if !pattern.node_types.contains(node_type) {
                return false;
            }
        }
    }

    if event.event_type.is_link_event() {
        if !pattern.link_types.is_empty() {
            let Some(link_type) = &event.link_type else {
                return false;
            };
            if !pattern.link_types.contains(link_type) {
                return false;
            }
        }
    }

    for (key, expected) in &pattern.meta_match {
        match event.meta.get(key) {
            Some(actual) if meta_values_equal(actual, expected) => {}
            _ => return false,
        }
    }

    true
}

/// Equality for `meta_match` values (§4.4): strings compare case-
/// insensitively; numerics (integer or float, on either side) convert to
/// `f64` and compare exactly; everything else falls back to plain
/// structural equality.
fn meta_values_equal(actual: &serde_json::Value, expected: &serde_json::Value) -> bool {
    use serde_json::Value;
    match (actual, expected) {
        (Value::String(a), Value::String(e)) => a.eq_ignore_ascii_case(e),
        (Value::Number(_), Value::Number(_)) => {
            actual.as_f64().zip(expected.as_f64()).is_some_and(|(a, e)| a == e)
        }
        _ => actual == expected,
    }
}
