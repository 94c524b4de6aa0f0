//! Token types for the Ymir REST DSL.

use std::fmt;

use ymir_core::Span;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    /// A path literal beginning with `/`. Escapes are already resolved.
    PathLiteral(String),

    // Keywords
    Target,
    Use,
    Router,
    Include,
    With,
    Body,
    Header,
    Query,
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    As,
    Public,
    Authenticated,
    Authenticate,
    Auth,
    Response,
    Responses,
    Render,
    Table,
    List,
    Detail,
    Form,
    TypeAny,
    TypeString,
    TypeFloat,
    TypeInt,
    TypeBoolean,
    TypeDatetime,
    TypeDate,
    TypeTime,

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Colon,        // :
    Semicolon,    // ;
    Question,     // ?
    Equals,       // =
    Ampersand,    // &
    At,           // @
    Hash,         // #
    Minus,        // -
    /// Operator characters recognized but unused by the grammar.
    Symbol(char),

    /// Error-recovery token for a character no rule accepted.
    Bad(char),
    /// End-of-file sentinel terminating every token stream.
    Eof,
}

impl Token {
    /// The word form of this token if it can serve as an identifier
    /// (plain identifiers plus the keywords that read as words).
    pub fn ident_text(&self) -> Option<&str> {
        match self {
            Token::Ident(name) => Some(name),
            Token::Target => Some("target"),
            Token::Use => Some("use"),
            Token::Router => Some("router"),
            Token::Include => Some("include"),
            Token::With => Some("with"),
            Token::Body => Some("body"),
            Token::Header => Some("header"),
            Token::Query => Some("query"),
            Token::As => Some("as"),
            Token::Public => Some("public"),
            Token::Authenticated => Some("authenticated"),
            Token::Authenticate => Some("authenticate"),
            Token::Auth => Some("auth"),
            Token::Response => Some("response"),
            Token::Responses => Some("responses"),
            Token::Render => Some("render"),
            Token::Table => Some("table"),
            Token::List => Some("list"),
            Token::Detail => Some("detail"),
            Token::Form => Some("form"),
            Token::TypeAny => Some("any"),
            Token::TypeString => Some("string"),
            Token::TypeFloat => Some("float"),
            Token::TypeInt => Some("int"),
            Token::TypeBoolean => Some("boolean"),
            Token::TypeDatetime => Some("datetime"),
            Token::TypeDate => Some("date"),
            Token::TypeTime => Some("time"),
            _ => None,
        }
    }

    /// The keyword form of a query-parameter type token.
    pub fn type_keyword(&self) -> Option<&'static str> {
        match self {
            Token::TypeAny => Some("any"),
            Token::TypeString => Some("string"),
            Token::TypeFloat => Some("float"),
            Token::TypeInt => Some("int"),
            Token::TypeBoolean => Some("boolean"),
            Token::TypeDatetime => Some("datetime"),
            Token::TypeDate => Some("date"),
            Token::TypeTime => Some("time"),
            _ => None,
        }
    }

    /// The HTTP method keyword, if this token is one.
    pub fn method_keyword(&self) -> Option<&'static str> {
        match self {
            Token::Get => Some("GET"),
            Token::Post => Some("POST"),
            Token::Put => Some("PUT"),
            Token::Delete => Some("DELETE"),
            Token::Patch => Some("PATCH"),
            Token::Head => Some("HEAD"),
            Token::Options => Some("OPTIONS"),
            _ => None,
        }
    }

    /// Short description used in "expected X, found Y" diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number `{n}`"),
            Token::Str(s) => format!("string \"{s}\""),
            Token::Bool(b) => format!("boolean `{b}`"),
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::PathLiteral(path) => format!("path `{path}`"),
            Token::Bad(c) => format!("invalid character `{c}`"),
            Token::Eof => "end of file".to_string(),
            other => format!("`{other}`"),
        }
    }
}

/// Map a lexed word to its keyword token, or an identifier.
pub fn keyword_or_ident(word: &str) -> Token {
    match word {
        "target" => Token::Target,
        "use" => Token::Use,
        "router" => Token::Router,
        "include" => Token::Include,
        "with" => Token::With,
        "body" => Token::Body,
        "header" => Token::Header,
        "query" => Token::Query,
        "GET" => Token::Get,
        "POST" => Token::Post,
        "PUT" => Token::Put,
        "DELETE" => Token::Delete,
        "PATCH" => Token::Patch,
        "HEAD" => Token::Head,
        "OPTIONS" => Token::Options,
        "as" => Token::As,
        "public" => Token::Public,
        "authenticated" => Token::Authenticated,
        "authenticate" => Token::Authenticate,
        "auth" => Token::Auth,
        "response" => Token::Response,
        "responses" => Token::Responses,
        "render" => Token::Render,
        "table" => Token::Table,
        "list" => Token::List,
        "detail" => Token::Detail,
        "form" => Token::Form,
        "any" => Token::TypeAny,
        "string" => Token::TypeString,
        "float" => Token::TypeFloat,
        "int" => Token::TypeInt,
        "boolean" => Token::TypeBoolean,
        "datetime" => Token::TypeDatetime,
        "date" => Token::TypeDate,
        "time" => Token::TypeTime,
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        _ => Token::Ident(word.to_string()),
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::PathLiteral(path) => write!(f, "{path}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Question => write!(f, "?"),
            Token::Equals => write!(f, "="),
            Token::Ampersand => write!(f, "&"),
            Token::At => write!(f, "@"),
            Token::Hash => write!(f, "#"),
            Token::Minus => write!(f, "-"),
            Token::Symbol(c) => write!(f, "{c}"),
            Token::Bad(c) => write!(f, "{c}"),
            Token::Eof => write!(f, "<eof>"),
            keyword => match keyword.ident_text().or_else(|| keyword.method_keyword()) {
                Some(text) => write!(f, "{text}"),
                None => Ok(()),
            },
        }
    }
}

/// A token with its source span and 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    pub token: Token,
    pub span: Span,
    pub line: u32,
}

impl PositionedToken {
    pub fn new(token: Token, span: Span, line: u32) -> Self {
        Self { token, span, line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword_or_ident("router"), Token::Router);
        assert_eq!(keyword_or_ident("GET"), Token::Get);
        assert_eq!(keyword_or_ident("true"), Token::Bool(true));
        assert_eq!(
            keyword_or_ident("routerx"),
            Token::Ident("routerx".to_string())
        );
    }

    #[test]
    fn test_ident_text_accepts_word_keywords() {
        assert_eq!(Token::Header.ident_text(), Some("header"));
        assert_eq!(Token::Ident("source".into()).ident_text(), Some("source"));
        assert_eq!(Token::Semicolon.ident_text(), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(Token::Eof.describe(), "end of file");
        assert_eq!(Token::Semicolon.describe(), "`;`");
        assert_eq!(Token::Ident("api".into()).describe(), "identifier `api`");
    }
}
