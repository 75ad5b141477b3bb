//! Advisory warnings for generation rounds.
//!
//! None of these stop a round; they are printed before it is dispatched.

use crate::entity::ToolSpecification;
use crate::prompt::Request;

/// Share of the request ceiling above which a warning is raised.
pub const REQUEST_WARNING_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Interaction rules left out because their condition is blank.
    DroppedRules { count: usize },
    /// Request is close to the configured size ceiling.
    RequestNearLimit { size: usize, limit: usize },
}

/// Warnings about a specification about to be composed.
pub fn check_specification(spec: &ToolSpecification) -> Vec<Warning> {
    let count = spec.dropped_rule_count();
    if count > 0 {
        vec![Warning::DroppedRules { count }]
    } else {
        Vec::new()
    }
}

/// Warnings about a compiled request.
pub fn check_request(request: &Request, limit: usize) -> Vec<Warning> {
    let size = request.size();
    if size as f64 > limit as f64 * REQUEST_WARNING_RATIO {
        vec![Warning::RequestNearLimit { size, limit }]
    } else {
        Vec::new()
    }
}

/// Format a warning for display.
pub fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::DroppedRules { count } => {
            format!(
                "Warning: {} interaction rule(s) without a condition will not be sent",
                count
            )
        }
        Warning::RequestNearLimit { size, limit } => {
            let pct = *size as f64 / *limit as f64 * 100.0;
            format!(
                "Warning: request is {} bytes ({:.0}% of the {} byte limit); further revisions may be refused",
                size, pct, limit
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::InteractionRule;
    use crate::prompt::Mode;

    fn request(size: usize) -> Request {
        Request {
            mode: Mode::Revise,
            instruction: String::new(),
            content: "x".repeat(size),
            payload: None,
        }
    }

    #[test]
    fn test_no_warnings_for_clean_spec() {
        assert!(check_specification(&ToolSpecification::template()).is_empty());
    }

    #[test]
    fn test_dropped_rules_warning() {
        let mut spec = ToolSpecification::template();
        spec.interaction_rules.push(InteractionRule::new("", "a"));
        spec.interaction_rules.push(InteractionRule::new(" ", "b"));
        assert_eq!(
            check_specification(&spec),
            vec![Warning::DroppedRules { count: 2 }]
        );
    }

    #[test]
    fn test_request_under_threshold() {
        assert!(check_request(&request(700), 1000).is_empty());
    }

    #[test]
    fn test_request_near_limit() {
        let warnings = check_request(&request(900), 1000);
        assert_eq!(
            warnings,
            vec![Warning::RequestNearLimit {
                size: 900,
                limit: 1000
            }]
        );
    }

    #[test]
    fn test_format_request_near_limit() {
        let msg = format_warning(&Warning::RequestNearLimit {
            size: 900,
            limit: 1000,
        });
        assert!(msg.contains("900"));
        assert!(msg.contains("90%"));
    }

    #[test]
    fn test_format_dropped_rules() {
        let msg = format_warning(&Warning::DroppedRules { count: 3 });
        assert!(msg.contains('3'));
    }
}
