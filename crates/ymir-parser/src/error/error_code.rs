//! Error codes for the Ymir diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Semantic errors
//! - `E3xx` - Include errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed before the end of
    /// the line or file.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that no lexer rule accepts. The lexer
    /// emits a bad token and continues.
    E002,

    /// Invalid escape sequence.
    ///
    /// An unrecognized escape sequence was used in a string literal.
    E003,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    /// The parser synthesizes the expected token and continues.
    E100,

    /// Unexpected end of file.
    ///
    /// The input ended before a complete construct was parsed.
    E101,

    // =========================================================================
    // Semantic Errors (E2xx)
    // =========================================================================
    /// Duplicate auth block identity.
    E200,

    /// More than one auth block claims `defaultAccess: authenticated`.
    E201,

    /// `use` or `auth` outside project scope.
    E202,

    /// Auth block is missing a valid `source` option.
    ///
    /// Every auth block must name where the credential is read from:
    /// `header`, `body`, or `query`.
    E203,

    /// Auth block is missing its `field` option.
    E204,

    /// `authenticate` without an identifier in a project with zero or
    /// several auth blocks.
    E205,

    /// Reference to an unknown auth block.
    E206,

    /// Unknown query parameter type.
    E207,

    /// Invalid `defaultAccess` value (must be `public` or `authenticated`).
    E208,

    /// Duplicate query parameter name within one path.
    E209,

    /// Unknown authentication type (must be `Bearer` or `API-Key`).
    E210,

    // =========================================================================
    // Include Errors (E3xx)
    // =========================================================================
    /// Included file could not be read.
    E300,

    /// Include cycle.
    ///
    /// A file includes itself, directly or through other includes.
    E301,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            ErrorCode::E210 => "E210",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of file",
            ErrorCode::E200 => "duplicate auth block",
            ErrorCode::E201 => "multiple default auth blocks",
            ErrorCode::E202 => "directive outside project scope",
            ErrorCode::E203 => "missing or invalid auth source",
            ErrorCode::E204 => "missing auth field",
            ErrorCode::E205 => "ambiguous authenticate clause",
            ErrorCode::E206 => "unknown auth block",
            ErrorCode::E207 => "unknown query parameter type",
            ErrorCode::E208 => "invalid defaultAccess value",
            ErrorCode::E209 => "duplicate query parameter",
            ErrorCode::E210 => "unknown authentication type",
            ErrorCode::E300 => "include not found",
            ErrorCode::E301 => "include cycle",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
