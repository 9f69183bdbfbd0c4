//! Execution trace formatting for history-aware errors.

/// First line of every execution trace.
pub const TRACE_HEADER: &str = "Pipeline step failed";

/// Line introducing the numbered step list.
pub const CHAIN_HEADER: &str = "Execution chain:";

/// Suffix marking the step that failed.
pub const FAILURE_MARKER: &str = "<-- failed here";

/// Separates the execution chain from the original error report.
pub const TRACE_SEPARATOR: &str = "----------------------------------------";

/// Number of trailing steps shown before older steps are collapsed.
pub const VISIBLE_STEPS: usize = 3;

/// Formats the execution chain for a failed pipeline.
///
/// Steps are numbered from 1 in execution order and the last entry is marked
/// as the failure point. Histories longer than [`VISIBLE_STEPS`] keep only
/// the tail, preceded by `...(n)` where `n` is the number of hidden steps; the
/// remaining entries keep their original positions.
///
/// ```
/// use stepchain::trace::format_execution_chain;
///
/// let history = vec!["parse".to_string(), "validate".to_string()];
/// let chain = format_execution_chain(&history);
/// assert!(chain.ends_with("2. validate <-- failed here"));
/// ```
#[must_use]
pub fn format_execution_chain(history: &[String]) -> String {
    let total = history.len();
    let hidden = total.saturating_sub(VISIBLE_STEPS);

    let mut lines = vec![TRACE_HEADER.to_string(), CHAIN_HEADER.to_string()];
    if hidden > 0 {
        lines.push(format!("  ...({hidden})"));
    }
    for (index, label) in history.iter().enumerate().skip(hidden) {
        let position = index + 1;
        if position == total {
            lines.push(format!("  {position}. {label} {FAILURE_MARKER}"));
        } else {
            lines.push(format!("  {position}. {label}"));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_empty_history_has_headers_only() {
        assert_eq!(
            format_execution_chain(&[]),
            "Pipeline step failed\nExecution chain:"
        );
    }

    #[test]
    fn test_single_step_is_marked() {
        assert_eq!(
            format_execution_chain(&labels(&["load"])),
            "Pipeline step failed\nExecution chain:\n  1. load <-- failed here"
        );
    }

    #[test]
    fn test_three_steps_are_not_collapsed() {
        let chain = format_execution_chain(&labels(&["a", "b", "c"]));
        assert_eq!(
            chain,
            "Pipeline step failed\nExecution chain:\n  1. a\n  2. b\n  3. c <-- failed here"
        );
        assert!(!chain.contains("..."));
    }

    #[test]
    fn test_five_steps_collapse_to_tail() {
        let chain = format_execution_chain(&labels(&["a", "b", "c", "d", "e"]));
        assert_eq!(
            chain,
            "Pipeline step failed\n\
             Execution chain:\n  \
             ...(2)\n  \
             3. c\n  \
             4. d\n  \
             5. e <-- failed here"
        );
    }

    #[test]
    fn test_failure_marker_appears_once() {
        let chain = format_execution_chain(&labels(&["a", "b", "c", "d"]));
        assert_eq!(chain.matches(FAILURE_MARKER).count(), 1);
        assert!(chain.contains("...(1)"));
        assert!(chain.contains("2. b"));
        assert!(!chain.contains("1. a"));
    }
}
