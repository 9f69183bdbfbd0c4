//! Step labelling and failure capture.

use crate::config::PipelineConfig;
use crate::errors::{BoxError, PipelineError};
use crate::history::StepHistory;

/// Label recorded for closures and other steps without a usable name.
pub const ANONYMOUS_STEP: &str = "anonymous";

/// Derives a history label from a step function's type.
///
/// Named `fn` items are recorded under their bare identifier with module
/// path and generic arguments removed (`my_crate::steps::parse::<u8>` becomes
/// `parse`). Closures, async blocks and function pointers are recorded as
/// [`ANONYMOUS_STEP`]. Labels come from [`std::any::type_name`], whose output
/// is best-effort; use the `*_as` chaining variants when a stable label
/// matters.
#[must_use]
pub fn step_label<F: ?Sized>() -> String {
    let path = strip_generics(std::any::type_name::<F>());
    let name = path.rsplit("::").next().unwrap_or_default();

    if name.is_empty() || name.starts_with("{{") || name.contains(&['(', ' ', '&', '*'][..]) {
        ANONYMOUS_STEP.to_string()
    } else {
        name.to_string()
    }
}

pub(crate) fn label_of<F>(_step: &F) -> String {
    step_label::<F>()
}

fn strip_generics(path: &str) -> String {
    let mut depth = 0usize;
    let mut stripped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }
    stripped
}

/// Turns a step error into the pipeline's failure.
///
/// `history` already includes the failing step.
pub(crate) fn capture_failure(
    error: BoxError,
    step: &str,
    history: &StepHistory,
    config: &PipelineConfig,
) -> PipelineError {
    tracing::debug!(
        step,
        position = history.len(),
        decorated = config.use_decorated_error,
        error = %error,
        "Pipeline step failed"
    );

    if config.use_decorated_error {
        PipelineError::decorate(error, history)
    } else {
        PipelineError::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_three(x: i32) -> i32 {
        x + 3
    }

    fn generic_identity<T>(value: T) -> T {
        value
    }

    #[test]
    fn test_named_fn_label() {
        assert_eq!(label_of(&add_three), "add_three");
    }

    #[test]
    fn test_generic_fn_label() {
        assert_eq!(label_of(&generic_identity::<Vec<u8>>), "generic_identity");
    }

    #[test]
    fn test_closure_is_anonymous() {
        let offset = 2;
        let step = move |x: i32| x + offset;
        assert_eq!(label_of(&step), ANONYMOUS_STEP);
    }

    #[test]
    fn test_fn_pointer_is_anonymous() {
        let step: fn(i32) -> i32 = add_three;
        assert_eq!(label_of(&step), ANONYMOUS_STEP);
    }

    #[test]
    fn test_method_path_label() {
        assert_eq!(label_of(&str::len), "len");
        assert_eq!(label_of(&<i32 as Clone>::clone), "clone");
    }

    #[test]
    fn test_strip_generics_nested() {
        assert_eq!(strip_generics("a::b<c::d<e>, f>::g"), "a::b::g");
    }

    #[test]
    fn test_capture_failure_respects_config() {
        let history = StepHistory::new().push("parse");

        let decorated = capture_failure(
            Box::new(std::fmt::Error),
            "parse",
            &history,
            &PipelineConfig::new(),
        );
        assert!(decorated.is_decorated());
        assert_eq!(decorated.failed_step(), Some("parse"));

        let raw = capture_failure(
            Box::new(std::fmt::Error),
            "parse",
            &history,
            &PipelineConfig::new().with_decorated_error(false),
        );
        assert!(!raw.is_decorated());
        assert!(raw.is::<std::fmt::Error>());
    }
}
