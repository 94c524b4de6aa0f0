//! Lexical analyzer for Ymir source text.
//!
//! The lexer converts source text into a stream of [`Token`]s terminated
//! by [`Token::Eof`]. Rules are tried in priority order: line comments,
//! string literals, path literals, numeric literals, words (keywords,
//! booleans, identifiers), then single-character punctuation.
//!
//! Lexing is error-recovering: an unterminated string or an unexpected
//! character produces a diagnostic and a [`Token::Bad`], and lexing
//! continues. Line comments never reach the parser; they are collected in
//! a side-channel dictionary keyed by line number so route descriptions
//! can be attached later.

use std::collections::BTreeMap;

use winnow::{
    Parser as _,
    ascii::float,
    combinator::{alt, not, opt, peek, preceded, repeat},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{Location, LocatingSlice, Stream},
    token::{any, one_of, take_while},
};

use ymir_core::Span;

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode};
use crate::span::LineIndex;
use crate::tokens::{PositionedToken, Token, keyword_or_ident};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.add_context()` so the main loop can
/// turn a failed rule into a collector diagnostic with a precise span.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type TResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// The lexer's output: the token stream plus the comment dictionary.
#[derive(Debug)]
pub struct LexOutput {
    /// In-order tokens, ending with [`Token::Eof`].
    pub tokens: Vec<PositionedToken>,
    /// `line -> text` for every `//` comment, trimmed.
    pub comments: BTreeMap<u32, String>,
}

/// Build a committed lexer error carrying a [`LexerDiagnostic`].
fn lex_error(input: &mut Input<'_>, diag: LexerDiagnostic) -> ErrMode<ContextError<LexerDiagnostic>> {
    let checkpoint = input.checkpoint();
    ErrMode::Cut(ContextError::new().add_context(input, &checkpoint, diag))
}

/// Parse a line comment after `//`, up to (not including) the newline.
fn line_comment(input: &mut Input<'_>) -> TResult<String> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(str::to_string)
        .parse_next(input)
}

/// Parse a string literal with single or double quotes.
///
/// Backslash escapes are resolved here; the token carries the decoded
/// value. A newline or end-of-file before the closing quote is an
/// unterminated-string error.
fn string_literal(input: &mut Input<'_>) -> TResult<Token> {
    let start = input.current_token_start();
    let quote: char = one_of(['"', '\'']).parse_next(input)?;

    let mut value = String::new();
    loop {
        match any::<_, ContextError<LexerDiagnostic>>.parse_next(input) {
            Ok(c) if c == quote => return Ok(Token::Str(value)),
            Ok('\n') | Err(_) => {
                return Err(lex_error(
                    input,
                    LexerDiagnostic {
                        code: ErrorCode::E001,
                        message: "unterminated string literal",
                        help: Some("add the closing quote"),
                        start,
                    },
                ));
            }
            Ok('\\') => {
                let escape_start = input.current_token_start() - 1;
                match any::<_, ContextError<LexerDiagnostic>>.parse_next(input) {
                    Ok(escape) => match resolve_escape(escape) {
                        Some(resolved) => value.push(resolved),
                        None => {
                            return Err(lex_error(
                                input,
                                LexerDiagnostic {
                                    code: ErrorCode::E003,
                                    message: "invalid escape sequence",
                                    help: Some(
                                        "valid escapes: `\\n`, `\\r`, `\\t`, `\\b`, `\\f`, \
                                         `\\\\`, `\\/`, `\\'`, `\\\"`, `\\0`",
                                    ),
                                    start: escape_start,
                                },
                            ));
                        }
                    },
                    Err(_) => {
                        return Err(lex_error(
                            input,
                            LexerDiagnostic {
                                code: ErrorCode::E001,
                                message: "unterminated string literal",
                                help: Some("add the closing quote"),
                                start,
                            },
                        ));
                    }
                }
            }
            Ok(c) => value.push(c),
        }
    }
}

fn resolve_escape(escape: char) -> Option<char> {
    match escape {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'b' => Some('\u{08}'),
        'f' => Some('\u{0C}'),
        '\\' => Some('\\'),
        '/' => Some('/'),
        '\'' => Some('\''),
        '"' => Some('"'),
        '0' => Some('\0'),
        _ => None,
    }
}

/// Parse a numeric literal.
///
/// Numbers are contiguous: an optional sign must be immediately followed
/// by a digit or a decimal point, so `- .5` is two tokens and a parse
/// error rather than a number.
fn number_literal(input: &mut Input<'_>) -> TResult<Token> {
    (
        peek((
            opt(one_of(['-'])),
            one_of(|c: char| c.is_ascii_digit() || c == '.'),
        )),
        float,
        // Not followed by an identifier character ("5x" is not a number).
        peek(not(one_of(|c: char| c.is_ascii_alphanumeric() || c == '_'))),
    )
        .map(|(_, value, _): (_, f64, _)| Token::Number(value))
        .parse_next(input)
}

/// Parse a path literal: `/` segments with `:name` variables,
/// `{name<type>}` templates, `#`/`-` literals, and `\?` `\;` `\ ` escapes.
fn path_literal(input: &mut Input<'_>) -> TResult<Token> {
    (
        // Leading slash; `//` is a comment, never a path.
        ('/', peek(not(one_of(['/'])))),
        repeat::<_, _, (), _, _>(0.., path_atom),
    )
        .take()
        .map(|raw: &str| Token::PathLiteral(unescape_path(raw)))
        .parse_next(input)
}

fn path_atom(input: &mut Input<'_>) -> TResult<()> {
    alt((
        // Escaped punctuation that would otherwise end the path
        preceded('\\', one_of(['?', ';', ' '])).void(),
        // `{name<type>}` template group
        (
            '{',
            take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
            '<',
            take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
            '>',
            '}',
        )
            .void(),
        one_of(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '#' | ':' | '.'))
            .void(),
        ('/', peek(not(one_of(['/'])))).void(),
    ))
    .parse_next(input)
}

/// Drop the backslash of `\?`, `\;` and `\ ` escapes.
fn unescape_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a word: a keyword, a boolean literal, or an identifier.
///
/// Identifiers follow `[A-Za-z_][A-Za-z0-9_\-]*`; maximal munch gives the
/// keyword/identifier distinction its word boundaries for free.
fn word(input: &mut Input<'_>) -> TResult<Token> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    })
    .verify(|s: &str| {
        s.chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    })
    .map(keyword_or_ident)
    .parse_next(input)
}

/// Parse a single punctuation character.
fn punctuation(input: &mut Input<'_>) -> TResult<Token> {
    any.verify_map(|c: char| match c {
        '(' => Some(Token::LeftParen),
        ')' => Some(Token::RightParen),
        '{' => Some(Token::LeftBrace),
        '}' => Some(Token::RightBrace),
        '[' => Some(Token::LeftBracket),
        ']' => Some(Token::RightBracket),
        '.' => Some(Token::Dot),
        ',' => Some(Token::Comma),
        ':' => Some(Token::Colon),
        ';' => Some(Token::Semicolon),
        '?' => Some(Token::Question),
        '=' => Some(Token::Equals),
        '&' => Some(Token::Ampersand),
        '@' => Some(Token::At),
        '#' => Some(Token::Hash),
        '-' => Some(Token::Minus),
        '!' | '<' | '>' | '+' | '*' | '%' | '|' | '^' | '~' => Some(Token::Symbol(c)),
        _ => None,
    })
    .parse_next(input)
}

fn token_rule(input: &mut Input<'_>) -> TResult<Token> {
    alt((
        string_literal,
        path_literal,
        number_literal,
        word,
        punctuation,
    ))
    .parse_next(input)
}

/// Tokenize `source`, reporting problems into `collector`.
///
/// Always returns a token stream ending with [`Token::Eof`]; failed rules
/// emit [`Token::Bad`] tokens and continue.
pub fn tokenize(
    source: &str,
    file: Option<&str>,
    collector: &mut DiagnosticCollector,
) -> LexOutput {
    let index = LineIndex::new(source);
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();
    let mut comments = BTreeMap::new();

    loop {
        let _ = take_while::<_, _, ContextError<LexerDiagnostic>>(0.., char::is_whitespace)
            .parse_next(&mut input);
        let start = input.current_token_start();

        if input.eof_offset() == 0 {
            tokens.push(PositionedToken::new(
                Token::Eof,
                Span::new(start..start),
                index.line_of(start),
            ));
            break;
        }

        // Comments go to the side channel, keyed by their line.
        if let Ok(text) = line_comment.parse_next(&mut input) {
            comments.insert(index.line_of(start), text.trim().to_string());
            continue;
        }

        match token_rule(&mut input) {
            Ok(token) => {
                let end = input.current_token_start();
                tokens.push(PositionedToken::new(
                    token,
                    Span::new(start..end),
                    index.line_of(start),
                ));
            }
            Err(ErrMode::Cut(ctx)) => {
                let end = input.current_token_start();
                let span = match ctx.context().next() {
                    Some(diag) => {
                        let span = Span::new(diag.start..end.max(diag.start + 1));
                        let mut report = Diagnostic::error(diag.message)
                            .with_code(diag.code)
                            .with_label(span, diag.code.description());
                        if let Some(help) = diag.help {
                            report = report.with_help(help);
                        }
                        if let Some(file) = file {
                            report = report.in_file(file);
                        }
                        collector.emit(report);
                        span
                    }
                    None => {
                        let span = Span::new(start..end.max(start + 1));
                        let mut report = Diagnostic::error("invalid token")
                            .with_code(ErrorCode::E002)
                            .with_label(span, "could not be lexed");
                        if let Some(file) = file {
                            report = report.in_file(file);
                        }
                        collector.emit(report);
                        span
                    }
                };
                tokens.push(PositionedToken::new(
                    Token::Bad(source[start..].chars().next().unwrap_or('\0')),
                    span,
                    index.line_of(start),
                ));
            }
            Err(_) => {
                // No rule matched: emit a bad token and advance one char.
                let bad = match any::<_, ContextError<LexerDiagnostic>>.parse_next(&mut input) {
                    Ok(c) => c,
                    Err(_) => '\0',
                };
                let end = input.current_token_start();
                let span = Span::new(start..end.max(start + 1));
                let mut report = Diagnostic::error(format!("unexpected character `{bad}`"))
                    .with_code(ErrorCode::E002)
                    .with_label(span, "no rule matches this character");
                if let Some(file) = file {
                    report = report.in_file(file);
                }
                collector.emit(report);
                tokens.push(PositionedToken::new(
                    Token::Bad(bad),
                    span,
                    index.line_of(start),
                ));
            }
        }
    }

    LexOutput { tokens, comments }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, BTreeMap<u32, String>, DiagnosticCollector) {
        let mut collector = DiagnosticCollector::new();
        let output = tokenize(source, None, &mut collector);
        let tokens = output.tokens.into_iter().map(|t| t.token).collect();
        (tokens, output.comments, collector)
    }

    fn lex_ok(source: &str) -> Vec<Token> {
        let (tokens, _, collector) = lex(source);
        assert!(
            !collector.has_errors(),
            "unexpected diagnostics: {:?}",
            collector.diagnostics()
        );
        tokens
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            lex_ok("target JavaScript_ExpressJS;"),
            vec![
                Token::Target,
                Token::Ident("JavaScript_ExpressJS".to_string()),
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_word_boundary() {
        assert_eq!(
            lex_ok("routerx router"),
            vec![
                Token::Ident("routerx".to_string()),
                Token::Router,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_identifier_with_hyphen() {
        assert_eq!(
            lex_ok("API-Key"),
            vec![Token::Ident("API-Key".to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(
            lex_ok("true false truthy"),
            vec![
                Token::Bool(true),
                Token::Bool(false),
                Token::Ident("truthy".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex_ok("42 -1.5 .25 1e3"),
            vec![
                Token::Number(42.0),
                Token::Number(-1.5),
                Token::Number(0.25),
                Token::Number(1000.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_interspace_sign_is_not_a_number() {
        assert_eq!(
            lex_ok("- .5"),
            vec![Token::Minus, Token::Number(0.5), Token::Eof]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            lex_ok(r#""hello world""#),
            vec![Token::Str("hello world".to_string()), Token::Eof]
        );
        assert_eq!(
            lex_ok("'single'"),
            vec![Token::Str("single".to_string()), Token::Eof]
        );
        assert_eq!(
            lex_ok(r#""a\nb\t\"c\"""#),
            vec![Token::Str("a\nb\t\"c\"".to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, _, collector) = lex("\"oops\nrouter");
        assert_eq!(collector.error_count(), 1);
        assert_eq!(
            collector.diagnostics()[0].code(),
            Some(ErrorCode::E001)
        );
        // Recovery continues on the next line.
        assert!(tokens.contains(&Token::Router));
        assert!(matches!(tokens[0], Token::Bad(_)));
    }

    #[test]
    fn test_invalid_escape() {
        let (_, _, collector) = lex(r#""bad\x""#);
        assert_eq!(collector.diagnostics()[0].code(), Some(ErrorCode::E003));
    }

    #[test]
    fn test_path_literals() {
        assert_eq!(
            lex_ok("/api/users"),
            vec![Token::PathLiteral("/api/users".to_string()), Token::Eof]
        );
        assert_eq!(
            lex_ok("/users/:id"),
            vec![Token::PathLiteral("/users/:id".to_string()), Token::Eof]
        );
        assert_eq!(
            lex_ok("/"),
            vec![Token::PathLiteral("/".to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_path_stops_at_query() {
        assert_eq!(
            lex_ok("/hello?name=string"),
            vec![
                Token::PathLiteral("/hello".to_string()),
                Token::Question,
                Token::Ident("name".to_string()),
                Token::Equals,
                Token::TypeString,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_path_escapes() {
        assert_eq!(
            lex_ok(r"/search\?q"),
            vec![Token::PathLiteral("/search?q".to_string()), Token::Eof]
        );
        assert_eq!(
            lex_ok(r"/a\ b"),
            vec![Token::PathLiteral("/a b".to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_path_template_group() {
        assert_eq!(
            lex_ok("/items/{id<int>}"),
            vec![
                Token::PathLiteral("/items/{id<int>}".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_path_does_not_eat_router_body() {
        assert_eq!(
            lex_ok("router /api {"),
            vec![
                Token::Router,
                Token::PathLiteral("/api".to_string()),
                Token::LeftBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_collected_by_line() {
        let (tokens, comments, collector) = lex("// first\nrouter /a {}\n// second\n");
        assert!(!collector.has_errors());
        assert_eq!(comments.get(&1).map(String::as_str), Some("first"));
        assert_eq!(comments.get(&3).map(String::as_str), Some("second"));
        assert_eq!(tokens[0], Token::Router);
    }

    #[test]
    fn test_bad_character_recovery() {
        let (tokens, _, collector) = lex("router ` /a");
        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.diagnostics()[0].code(), Some(ErrorCode::E002));
        assert_eq!(
            tokens,
            vec![
                Token::Router,
                Token::Bad('`'),
                Token::PathLiteral("/a".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_token_lines() {
        let mut collector = DiagnosticCollector::new();
        let output = tokenize("target T;\nrouter /a {}\n", None, &mut collector);
        assert_eq!(output.tokens[0].line, 1); // target
        assert_eq!(output.tokens[3].line, 2); // router
    }

    #[test]
    fn test_spans_match_source() {
        let source = "router /api { GET /x; }";
        let mut collector = DiagnosticCollector::new();
        let output = tokenize(source, None, &mut collector);

        for token in &output.tokens {
            if matches!(token.token, Token::Eof) {
                continue;
            }
            let text = &source[token.span.start()..token.span.end()];
            // Path and word tokens reproduce their source text exactly.
            if let Token::PathLiteral(path) = &token.token {
                assert_eq!(text, path);
            }
            assert!(!text.is_empty());
        }
    }

    #[test]
    fn test_punctuation_stream() {
        assert_eq!(
            lex_ok("( ) { } [ ] , : ; ? = & @ ."),
            vec![
                Token::LeftParen,
                Token::RightParen,
                Token::LeftBrace,
                Token::RightBrace,
                Token::LeftBracket,
                Token::RightBracket,
                Token::Comma,
                Token::Colon,
                Token::Semicolon,
                Token::Question,
                Token::Equals,
                Token::Ampersand,
                Token::At,
                Token::Dot,
                Token::Eof,
            ]
        );
    }
}
