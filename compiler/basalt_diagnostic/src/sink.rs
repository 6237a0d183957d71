//! The diagnostic sink.

use crate::{Diagnostic, Severity};

/// Reporting callback: `(file_name, line, column, message, is_error)`.
pub type MessageCallback<'a> = Box<dyn FnMut(&str, u32, u32, &str, bool) + 'a>;

/// Bound on suppressed errors during speculative parsing. Once exceeded,
/// speculative paths must fail eagerly so pathological inputs cannot
/// explode lookahead.
pub const MAX_SUPPRESSED_ERRORS: u32 = 500;

/// Collects diagnostics for one parser instance.
///
/// While `suppress_depth > 0` (at least one active bookmark), both error
/// and warning paths only bump `suppressed_count`; nothing is published
/// and the callback is not invoked.
pub struct DiagnosticSink<'a> {
    file_name: &'a str,
    error_count: u32,
    warning_count: u32,
    suppressed_count: u32,
    suppress_depth: u32,
    callback: Option<MessageCallback<'a>>,
    published: Vec<Diagnostic>,
}

impl<'a> DiagnosticSink<'a> {
    pub fn new(file_name: &'a str, callback: Option<MessageCallback<'a>>) -> Self {
        DiagnosticSink {
            file_name,
            error_count: 0,
            warning_count: 0,
            suppressed_count: 0,
            suppress_depth: 0,
            callback,
            published: Vec::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        self.file_name
    }

    /// Report a diagnostic, or count it as suppressed inside a
    /// suppression scope.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.suppress_depth > 0 {
            self.suppressed_count += 1;
            return;
        }
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(
                self.file_name,
                diagnostic.line,
                diagnostic.column,
                &diagnostic.message,
                diagnostic.is_error(),
            );
        }
        self.published.push(diagnostic);
    }

    /// Enter a suppression scope. Called when a bookmark is set.
    pub fn push_suppress(&mut self) {
        self.suppress_depth += 1;
    }

    /// Leave a suppression scope. Called when a bookmark is resolved.
    pub fn pop_suppress(&mut self) {
        debug_assert!(self.suppress_depth > 0, "unbalanced suppression scope");
        self.suppress_depth = self.suppress_depth.saturating_sub(1);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }

    /// True once the suppressed-error bound has been exceeded;
    /// speculative parsing must then return failure eagerly.
    pub fn at_error_cap(&self) -> bool {
        self.suppressed_count > MAX_SUPPRESSED_ERRORS
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn suppressed_count(&self) -> u32 {
        self.suppressed_count
    }

    /// Consume the sink, yielding every published diagnostic in order.
    pub fn into_published(self) -> Vec<Diagnostic> {
        self.published
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions")]

    use super::*;
    use crate::ErrorCode;
    use std::cell::RefCell;

    #[test]
    fn counts_and_publishes() {
        let mut sink = DiagnosticSink::new("t.bst", None);
        sink.report(Diagnostic::error(ErrorCode::E1001, "bad", 1, 1));
        sink.report(Diagnostic::warning(ErrorCode::W1001, "meh", 2, 2));
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.into_published().len(), 2);
    }

    #[test]
    fn suppression_counts_separately() {
        let mut sink = DiagnosticSink::new("t.bst", None);
        sink.push_suppress();
        sink.report(Diagnostic::error(ErrorCode::E1001, "spec", 1, 1));
        sink.report(Diagnostic::warning(ErrorCode::W1001, "spec", 1, 2));
        sink.pop_suppress();
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.warning_count(), 0);
        assert_eq!(sink.suppressed_count(), 2);
        assert!(sink.into_published().is_empty());
    }

    #[test]
    fn nested_suppression() {
        let mut sink = DiagnosticSink::new("t.bst", None);
        sink.push_suppress();
        sink.push_suppress();
        sink.pop_suppress();
        assert!(sink.is_suppressed());
        sink.pop_suppress();
        assert!(!sink.is_suppressed());
    }

    #[test]
    fn callback_sees_published_events_only() {
        let seen: RefCell<Vec<(u32, u32, bool)>> = RefCell::new(Vec::new());
        {
            let callback: MessageCallback<'_> = Box::new(|_, line, column, _, is_error| {
                seen.borrow_mut().push((line, column, is_error));
            });
            let mut sink = DiagnosticSink::new("t.bst", Some(callback));
            sink.push_suppress();
            sink.report(Diagnostic::error(ErrorCode::E1001, "hidden", 5, 5));
            sink.pop_suppress();
            sink.report(Diagnostic::error(ErrorCode::E1001, "shown", 7, 3));
        }
        assert_eq!(seen.into_inner(), vec![(7, 3, true)]);
    }

    #[test]
    fn error_cap_trips_past_bound() {
        let mut sink = DiagnosticSink::new("t.bst", None);
        sink.push_suppress();
        for _ in 0..=MAX_SUPPRESSED_ERRORS {
            assert!(!sink.at_error_cap() || sink.suppressed_count() > MAX_SUPPRESSED_ERRORS);
            sink.report(Diagnostic::error(ErrorCode::E1002, "x", 1, 1));
        }
        assert!(sink.at_error_cap());
    }
}
