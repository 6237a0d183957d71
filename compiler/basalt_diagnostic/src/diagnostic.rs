//! Diagnostic events and error codes.

use std::fmt;

/// Error code for searchability.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Expectation failure: found a token other than the required one.
    E1001,
    /// Expected a declaration, statement, or other sub-production.
    E1002,
    /// Malformed construct (bad foreach variable count, missing catch, ...).
    E1003,
    /// Implicit concatenation of adjacent string literals.
    W1001,
    /// Protection attribute on a base class.
    W1002,
    /// C-style array declarator.
    W1003,
    /// Legacy alias syntax.
    W1004,
}

impl ErrorCode {
    pub const fn is_warning(self) -> bool {
        matches!(
            self,
            ErrorCode::W1001 | ErrorCode::W1002 | ErrorCode::W1003 | ErrorCode::W1004
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::W1001 => "W1001",
            ErrorCode::W1002 => "W1002",
            ErrorCode::W1003 => "W1003",
            ErrorCode::W1004 => "W1004",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

/// One published diagnostic event.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    /// 1-based source position.
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    #[cold]
    pub fn error(code: ErrorCode, message: impl Into<String>, line: u32, column: u32) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            message: message.into(),
            line,
            column,
        }
    }

    #[cold]
    pub fn warning(code: ErrorCode, message: impl Into<String>, line: u32, column: u32) -> Self {
        Diagnostic {
            code,
            severity: Severity::Warning,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render as the one-line textual format:
    /// `fileName(line:column)[error|warn]: message`
    pub fn render(&self, file_name: &str) -> String {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warn",
        };
        format!(
            "{}({}:{})[{}]: {}",
            file_name, self.line, self.column, tag, self.message
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warn",
        };
        write!(
            f,
            "({}:{})[{}]: {}",
            self.line, self.column, tag, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_matches_line_format() {
        let d = Diagnostic::error(ErrorCode::E1001, "expected `;`", 3, 14);
        assert_eq!(d.render("app.bst"), "app.bst(3:14)[error]: expected `;`");

        let w = Diagnostic::warning(ErrorCode::W1001, "implicit concatenation", 9, 1);
        assert_eq!(
            w.render("lib.bst"),
            "lib.bst(9:1)[warn]: implicit concatenation"
        );
    }

    #[test]
    fn warning_codes_classify() {
        assert!(ErrorCode::W1003.is_warning());
        assert!(!ErrorCode::E1002.is_warning());
    }
}
