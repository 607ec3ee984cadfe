//! Fixed policy responses for queries the knowledge base does not answer.

use crate::types::Category;

pub const RETURNS_POLICY_MESSAGE: &str = "For return-related queries, please contact our support team at support@techgear.com or call 1-800-TECH-GEAR. Our returns process typically takes 5-7 business days.";

pub const HUMAN_ESCALATION_MESSAGE: &str = "I'm sorry, I cannot handle this general query. Let me escalate this to a human agent who can assist you further.";

/// Pick the canned response for a category. Pure lookup, no external calls,
/// cannot fail; anything that is not a returns question gets the human
/// escalation message.
pub fn respond(category: Category) -> &'static str {
    match category {
        Category::Returns => RETURNS_POLICY_MESSAGE,
        _ => HUMAN_ESCALATION_MESSAGE,
    }
}
