//! Parser for Ymir token streams.
//!
//! Recursive descent with one token of lookahead. The parser owns a cursor
//! over the token stream and reports into the shared
//! [`DiagnosticCollector`]; a failed expectation emits a diagnostic and
//! continues with a synthesized token, so one script produces as many
//! diagnostics as possible in a single compile.
//!
//! `include` directives are resolved here: the referenced file is read
//! through the [`FileProvider`], lexed and parsed with the same collector,
//! and its routes and routers are appended to the including router. A
//! stack of canonical file paths detects include cycles.

use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};

use log::{debug, trace};

use ymir_core::auth::{AuthBlock, AuthSource, AuthType, AuthenticateClause, DefaultAccess};
use ymir_core::ident;
use ymir_core::option::{OptionMap, OptionValue};
use ymir_core::path::{ParamType, Path, QueryParameter};
use ymir_core::render::{RenderBlock, RenderKind};
use ymir_core::route::{Method, Route};
use ymir_core::router::{Middleware, Project, Router};
use ymir_core::{GlobalVariable, Span};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError};
use crate::lexer;
use crate::source::{FileProvider, SourceSet};
use crate::span::LineIndex;
use crate::tokens::{PositionedToken, Token};
use crate::validate;

/// What to do with the AST when errors were recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Return no AST if any error occurred.
    #[default]
    CancelOnFirstError,
    /// Return the (possibly partial) AST regardless.
    IgnoreErrors,
}

/// The result of one compile: the AST (subject to the policy), every
/// diagnostic recorded, and the sources read along the way.
#[derive(Debug)]
pub struct Compilation {
    pub project: Option<Project>,
    pub diagnostics: Vec<Diagnostic>,
    pub sources: SourceSet,
}

impl Compilation {
    /// Number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity().is_error())
            .count()
    }

    /// Number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity().is_warning())
            .count()
    }

    /// Convert into a plain result, dropping warnings on success.
    pub fn into_result(self) -> Result<Project, ParseError> {
        match self.project {
            Some(project) => Ok(project),
            None => Err(ParseError::new(self.diagnostics)),
        }
    }
}

/// Parse the script at `entry` into a [`Project`].
///
/// This is the main entry point of the parsing pipeline: it reads the
/// entry file through `provider`, tokenizes and parses it (resolving
/// includes recursively), runs the validation pass, and applies `policy`.
pub fn parse_project(
    entry: &FsPath,
    provider: &dyn FileProvider,
    policy: ParsePolicy,
) -> Compilation {
    let mut session = ParseSession {
        provider,
        collector: DiagnosticCollector::new(),
        sources: SourceSet::new(),
        stack: Vec::new(),
    };

    let mut project = session.parse_entry(entry);

    if let Some(project) = project.as_mut() {
        validate::resolve_auth_references(project, &mut session.collector);
    }

    let has_errors = session.collector.has_errors();
    let diagnostics = session.collector.finish();

    let project = match policy {
        ParsePolicy::CancelOnFirstError if has_errors => None,
        _ => project,
    };

    Compilation {
        project,
        diagnostics,
        sources: session.sources,
    }
}

/// Everything known about one lexed file while parsing it.
struct FileContext {
    /// Display path used in diagnostics.
    display: String,
    index: LineIndex,
    /// `line -> comment` side channel from the lexer.
    comments: BTreeMap<u32, String>,
    /// Directory for resolving relative includes.
    dir: PathBuf,
}

impl FileContext {
    fn position(&self, span: Span) -> ymir_core::SourcePosition {
        self.index.position(Some(&self.display), span)
    }
}

/// Project-scoped declarations accumulated across files.
#[derive(Default)]
struct ProjectScope {
    middlewares: Vec<Middleware>,
    auth_blocks: indexmap::IndexMap<String, AuthBlock>,
}

/// A cursor over one file's token stream.
struct Cursor<'t> {
    tokens: &'t [PositionedToken],
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [PositionedToken]) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| &t.token),
            Some(Token::Eof)
        ));
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &'t PositionedToken {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_token(&self) -> &'t Token {
        &self.peek().token
    }

    /// Return the current token and advance, stopping at end-of-file.
    fn advance(&mut self) -> &'t PositionedToken {
        let token = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_token(), Token::Eof)
    }
}

struct ParseSession<'p> {
    provider: &'p dyn FileProvider,
    collector: DiagnosticCollector,
    sources: SourceSet,
    /// Canonical paths of the files currently being parsed.
    stack: Vec<PathBuf>,
}

impl ParseSession<'_> {
    // =====================================================================
    // File handling
    // =====================================================================

    /// Read, record, and tokenize a file. Pushes it onto the file stack;
    /// the caller pops after parsing. Returns `None` (with a diagnostic)
    /// on read failures and include cycles.
    fn load_file(
        &mut self,
        path: &FsPath,
        include_site: Option<(Span, &FileContext)>,
    ) -> Option<(FileContext, Vec<PositionedToken>)> {
        let canonical = self
            .provider
            .canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf());

        if self.stack.contains(&canonical) {
            let mut diag = Diagnostic::error(format!(
                "include cycle: `{}` is already being parsed",
                path.display()
            ))
            .with_code(ErrorCode::E301)
            .with_help("remove the circular include");
            if let Some((span, ctx)) = include_site {
                diag = diag
                    .with_label(span, "includes a file from its own include chain")
                    .in_file(&ctx.display);
            }
            self.collector.emit(diag);
            return None;
        }

        let text = match self.provider.read(path) {
            Ok(text) => text,
            Err(err) => {
                let mut diag =
                    Diagnostic::error(format!("cannot read `{}`: {err}", path.display()))
                        .with_code(ErrorCode::E300);
                if let Some((span, ctx)) = include_site {
                    diag = diag
                        .with_label(span, "included here")
                        .in_file(&ctx.display);
                }
                self.collector.emit(diag);
                return None;
            }
        };

        let display = path.display().to_string();
        debug!(file = display; "Lexing source file");
        self.sources.insert(display.clone(), text.clone());

        let output = lexer::tokenize(&text, Some(&display), &mut self.collector);
        trace!(file = display, tokens = output.tokens.len(); "Lexed");

        self.stack.push(canonical);
        Some((
            FileContext {
                display,
                index: LineIndex::new(&text),
                comments: output.comments,
                dir: path.parent().map(FsPath::to_path_buf).unwrap_or_default(),
            },
            output.tokens,
        ))
    }

    fn parse_entry(&mut self, path: &FsPath) -> Option<Project> {
        let (ctx, tokens) = self.load_file(path, None)?;
        let mut cursor = Cursor::new(&tokens);

        let project = self.parse_target(&mut cursor, &ctx);
        let Some(mut project) = project else {
            self.stack.pop();
            return None;
        };

        let mut scope = ProjectScope::default();
        self.parse_items(&mut cursor, &ctx, &mut scope, &mut project.root, true);
        self.consume_trailing(&mut cursor, &ctx);
        self.stack.pop();

        project.middlewares = scope.middlewares;
        project.auth_blocks = scope.auth_blocks;
        Some(project)
    }

    /// Report any tokens left after the top-level items of a file.
    fn consume_trailing(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) {
        while !cur.at_eof() {
            let tok = cur.advance();
            self.error_at(
                ctx,
                tok.span,
                ErrorCode::E100,
                format!("unexpected {}", tok.token.describe()),
                "not part of any declaration",
                None,
            );
        }
    }

    // =====================================================================
    // Diagnostics
    // =====================================================================

    fn error_at(
        &mut self,
        ctx: &FileContext,
        span: Span,
        code: ErrorCode,
        message: impl Into<String>,
        label: &str,
        help: Option<&str>,
    ) {
        let mut diag = Diagnostic::error(message)
            .with_code(code)
            .with_label(span, label)
            .in_file(&ctx.display);
        if let Some(help) = help {
            diag = diag.with_help(help);
        }
        self.collector.emit(diag);
    }

    /// Match the next token against `accepts`.
    ///
    /// On success the token is consumed and returned. On failure a
    /// diagnostic naming `expected` (plus an optional hint) is emitted and
    /// `None` is returned *without* consuming the token; the caller
    /// continues as if the expected token had been present.
    fn expect<'t>(
        &mut self,
        cur: &mut Cursor<'t>,
        ctx: &FileContext,
        accepts: impl Fn(&Token) -> bool,
        expected: &str,
        hint: Option<&str>,
    ) -> Option<&'t PositionedToken> {
        let token = cur.peek();
        if accepts(&token.token) {
            return Some(cur.advance());
        }

        let code = if matches!(token.token, Token::Eof) {
            ErrorCode::E101
        } else {
            ErrorCode::E100
        };
        self.error_at(
            ctx,
            token.span,
            code,
            format!("expected {expected}, found {}", token.token.describe()),
            format!("expected {expected}").as_str(),
            hint,
        );
        None
    }

    /// Consume a statement-terminating semicolon if present.
    ///
    /// Semicolons are optional in recovery mode; a missing one is
    /// synthesized silently.
    fn eat_semicolon(&mut self, cur: &mut Cursor<'_>) {
        if matches!(cur.peek_token(), Token::Semicolon) {
            cur.advance();
        }
    }

    /// Skip to the end of the current statement after an unrecoverable
    /// mismatch: everything up to and including the next `;`, stopping
    /// early at `}` or end-of-file.
    fn skip_statement(&mut self, cur: &mut Cursor<'_>) {
        loop {
            match cur.peek_token() {
                Token::Eof | Token::RightBrace => break,
                Token::Semicolon => {
                    cur.advance();
                    break;
                }
                _ => {
                    cur.advance();
                }
            }
        }
    }

    // =====================================================================
    // Grammar
    // =====================================================================

    /// `project := "target" IDENT ";" { project_item }`
    fn parse_target(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> Option<Project> {
        let start = cur.peek().span;
        self.expect(
            cur,
            ctx,
            |t| matches!(t, Token::Target),
            "`target`",
            Some("every script starts with `target <Name>;`"),
        )?;
        let name_tok = self.expect(
            cur,
            ctx,
            |t| t.ident_text().is_some(),
            "a target name",
            None,
        )?;
        let name = name_tok.token.ident_text().unwrap_or_default().to_string();
        self.eat_semicolon(cur);

        let pos = ctx.position(start.union(name_tok.span));
        Some(Project::new(name, pos))
    }

    /// Parse router/project items until `}` or end-of-file.
    fn parse_items(
        &mut self,
        cur: &mut Cursor<'_>,
        ctx: &FileContext,
        scope: &mut ProjectScope,
        router: &mut Router,
        at_project_scope: bool,
    ) {
        loop {
            match cur.peek_token() {
                Token::Eof | Token::RightBrace => break,
                Token::Use => self.parse_middleware(cur, ctx, scope, at_project_scope),
                Token::Auth => self.parse_auth_block(cur, ctx, scope, at_project_scope),
                Token::Include => self.parse_include(cur, ctx, scope, router, at_project_scope),
                Token::Router => {
                    if let Some(child) = self.parse_router(cur, ctx, scope) {
                        router.routers.push(child);
                    }
                }
                token if token.method_keyword().is_some() => {
                    if let Some(route) = self.parse_route(cur, ctx) {
                        router.routes.push(route);
                    }
                }
                Token::Semicolon => {
                    // Stray semicolons are harmless.
                    cur.advance();
                }
                _ => {
                    let tok = cur.advance();
                    self.error_at(
                        ctx,
                        tok.span,
                        ErrorCode::E100,
                        format!("unexpected {}", tok.token.describe()),
                        "expected a route, router, or directive",
                        None,
                    );
                }
            }
        }
    }

    /// `router := "router" path { header|body|authenticate } "{" { child } "}"`
    fn parse_router(
        &mut self,
        cur: &mut Cursor<'_>,
        ctx: &FileContext,
        scope: &mut ProjectScope,
    ) -> Option<Router> {
        let kw = cur.advance();
        let Some(path) = self.parse_path(cur, ctx) else {
            self.skip_statement(cur);
            return None;
        };

        let mut router = Router::new(path, ctx.position(kw.span));
        loop {
            match cur.peek_token() {
                Token::Header => {
                    cur.advance();
                    router.header = Some(self.parse_paren_options(cur, ctx));
                }
                Token::Body => {
                    cur.advance();
                    router.body = Some(self.parse_paren_options(cur, ctx));
                }
                Token::Authenticate => {
                    router.authenticate = Some(self.parse_authenticate(cur, ctx));
                }
                _ => break,
            }
        }

        // A missing brace is synthesized; children are parsed either way.
        self.expect(cur, ctx, |t| matches!(t, Token::LeftBrace), "`{`", None);
        self.parse_items(cur, ctx, scope, &mut router, false);
        self.expect(cur, ctx, |t| matches!(t, Token::RightBrace), "`}`", None);
        self.eat_semicolon(cur);

        Some(router)
    }

    /// `route := METHOD path { header|body|authenticate|response|render } ";"`
    fn parse_route(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> Option<Route> {
        let method_tok = cur.advance();
        let method = method_tok
            .token
            .method_keyword()
            .and_then(Method::parse)
            .expect("caller checked the method keyword");

        let Some(path) = self.parse_path(cur, ctx) else {
            self.skip_statement(cur);
            return None;
        };

        let mut route = Route::new(method, path, ctx.position(method_tok.span));
        // The comment on the line right above the route becomes its
        // description.
        if method_tok.line > 1 {
            route.description = ctx.comments.get(&(method_tok.line - 1)).cloned();
        }

        loop {
            match cur.peek_token() {
                Token::Header => {
                    cur.advance();
                    route.header = Some(self.parse_paren_options(cur, ctx));
                }
                Token::Body => {
                    cur.advance();
                    route.body = Some(self.parse_paren_options(cur, ctx));
                }
                Token::Response => {
                    cur.advance();
                    route.response = Some(self.parse_paren_options(cur, ctx));
                    route.is_response_plural = Some(false);
                }
                Token::Responses => {
                    cur.advance();
                    route.response = Some(self.parse_paren_options(cur, ctx));
                    route.is_response_plural = Some(true);
                }
                Token::Authenticate => {
                    route.authenticate = Some(self.parse_authenticate(cur, ctx));
                }
                Token::Render => {
                    route.render = self.parse_render(cur, ctx);
                }
                _ => break,
            }
        }

        self.eat_semicolon(cur);
        Some(route)
    }

    /// `path := PATH [ "?" query_param { "&" query_param } ] [ "as" IDENT ]`
    fn parse_path(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> Option<Path> {
        let tok = self.expect(
            cur,
            ctx,
            |t| matches!(t, Token::PathLiteral(_)),
            "a path",
            Some("paths begin with `/`"),
        )?;
        let Token::PathLiteral(raw) = &tok.token else {
            unreachable!("expect() checked the token kind");
        };

        let mut path = Path::new(raw.clone(), ctx.position(tok.span));

        if matches!(cur.peek_token(), Token::Question) {
            cur.advance();
            loop {
                let Some(name_tok) = self.expect(
                    cur,
                    ctx,
                    |t| t.ident_text().is_some(),
                    "a query parameter name",
                    None,
                ) else {
                    break;
                };
                let name = name_tok.token.ident_text().unwrap_or_default().to_string();

                self.expect(cur, ctx, |t| matches!(t, Token::Equals), "`=`", None);

                let ty_tok = cur.peek();
                let ty = match ty_tok.token.type_keyword().and_then(ParamType::parse) {
                    Some(ty) => {
                        cur.advance();
                        ty
                    }
                    None => {
                        self.error_at(
                            ctx,
                            ty_tok.span,
                            ErrorCode::E207,
                            format!(
                                "unknown query parameter type {}",
                                ty_tok.token.describe()
                            ),
                            "not a parameter type",
                            Some(
                                "valid types: any, string, int, float, boolean, \
                                 date, datetime, time",
                            ),
                        );
                        cur.advance();
                        ParamType::Any
                    }
                };

                if path.query.iter().any(|p| p.name == name) {
                    self.error_at(
                        ctx,
                        name_tok.span,
                        ErrorCode::E209,
                        format!("duplicate query parameter `{name}`"),
                        "already declared for this path",
                        None,
                    );
                } else {
                    path.query.push(QueryParameter { name, ty });
                }

                if matches!(cur.peek_token(), Token::Ampersand) {
                    cur.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(cur.peek_token(), Token::As) {
            cur.advance();
            if let Some(alias_tok) = self.expect(
                cur,
                ctx,
                |t| t.ident_text().is_some(),
                "an alias identifier",
                None,
            ) {
                let alias = alias_tok.token.ident_text().unwrap_or_default();
                path.alias = Some(ident::sanitize(alias));
            }
        }

        Some(path)
    }

    /// `authenticate := "authenticate" [ IDENT ] [ "with" roles ]`
    fn parse_authenticate(
        &mut self,
        cur: &mut Cursor<'_>,
        ctx: &FileContext,
    ) -> AuthenticateClause {
        let kw = cur.advance();
        let mut clause = AuthenticateClause::new("", ctx.position(kw.span));

        // `with` reads as a word, so rule it out before taking the block
        // identity.
        if !matches!(cur.peek_token(), Token::With) {
            if let Some(text) = cur.peek_token().ident_text() {
                clause.block = text.to_string();
                cur.advance();
            }
        }

        if matches!(cur.peek_token(), Token::With) {
            cur.advance();
            clause.roles = self.parse_role_list(cur, ctx);
        }

        clause
    }

    /// `roles := STRING | "[" STRING { "," STRING } "]"`
    fn parse_role_list(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> Vec<String> {
        let mut roles = Vec::new();
        match cur.peek_token() {
            Token::Str(role) => {
                roles.push(role.clone());
                cur.advance();
            }
            Token::LeftBracket => {
                cur.advance();
                loop {
                    match cur.peek_token() {
                        Token::Str(role) => {
                            roles.push(role.clone());
                            cur.advance();
                        }
                        Token::RightBracket => {
                            cur.advance();
                            break;
                        }
                        _ => {
                            let tok = cur.peek();
                            self.error_at(
                                ctx,
                                tok.span,
                                ErrorCode::E100,
                                format!("expected a role string, found {}", tok.token.describe()),
                                "roles are quoted strings",
                                None,
                            );
                            break;
                        }
                    }
                    if matches!(cur.peek_token(), Token::Comma) {
                        cur.advance();
                    }
                }
            }
            other => {
                let span = cur.peek().span;
                self.error_at(
                    ctx,
                    span,
                    ErrorCode::E100,
                    format!("expected roles after `with`, found {}", other.describe()),
                    "expected a string or `[\"role\", ...]`",
                    None,
                );
            }
        }
        roles
    }

    /// `render := "render" ("list"|"table"|"detail"|"form") [ "(" options ")" ]`
    fn parse_render(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> Option<RenderBlock> {
        let kw = cur.advance();
        let kind = match cur.peek_token() {
            Token::List => RenderKind::List,
            Token::Table => RenderKind::Table,
            Token::Detail => RenderKind::Detail,
            Token::Form => RenderKind::Form,
            other => {
                let span = cur.peek().span;
                self.error_at(
                    ctx,
                    span,
                    ErrorCode::E100,
                    format!("expected a render kind, found {}", other.describe()),
                    "expected `list`, `table`, `detail`, or `form`",
                    None,
                );
                return None;
            }
        };
        cur.advance();

        let mut block = RenderBlock::new(kind, ctx.position(kw.span));
        if matches!(cur.peek_token(), Token::LeftParen) {
            block.options = self.parse_paren_options(cur, ctx);
        }
        Some(block)
    }

    /// `middleware := "use" IDENT [ "(" options ")" ] ";"`
    fn parse_middleware(
        &mut self,
        cur: &mut Cursor<'_>,
        ctx: &FileContext,
        scope: &mut ProjectScope,
        at_project_scope: bool,
    ) {
        let kw = cur.advance();
        let Some(name_tok) = self.expect(
            cur,
            ctx,
            |t| t.ident_text().is_some(),
            "a middleware name",
            None,
        ) else {
            self.skip_statement(cur);
            return;
        };
        let name = name_tok.token.ident_text().unwrap_or_default().to_string();

        let options = if matches!(cur.peek_token(), Token::LeftParen) {
            self.parse_paren_options(cur, ctx)
        } else {
            OptionMap::new()
        };
        self.eat_semicolon(cur);

        if !at_project_scope {
            self.error_at(
                ctx,
                kw.span,
                ErrorCode::E202,
                "`use` is only legal at project scope",
                "middleware cannot be declared inside a router",
                Some("move this directive above the first router"),
            );
            return;
        }

        scope.middlewares.push(Middleware {
            name,
            options,
            pos: ctx.position(kw.span.union(name_tok.span)),
        });
    }

    /// `auth_block := "auth" IDENT ( options? alias? | alias? options? ) ";"`
    fn parse_auth_block(
        &mut self,
        cur: &mut Cursor<'_>,
        ctx: &FileContext,
        scope: &mut ProjectScope,
        at_project_scope: bool,
    ) {
        let kw = cur.advance();
        let Some(type_tok) = self.expect(
            cur,
            ctx,
            |t| t.ident_text().is_some(),
            "an authentication type",
            Some("`Bearer` or `API-Key`"),
        ) else {
            self.skip_statement(cur);
            return;
        };
        let type_text = type_tok.token.ident_text().unwrap_or_default().to_string();
        let auth_type = AuthType::parse(&type_text);

        // `as` alias and the option list may come in either order.
        let mut alias = None;
        let mut options = OptionMap::new();
        loop {
            match cur.peek_token() {
                Token::As => {
                    cur.advance();
                    if let Some(alias_tok) = self.expect(
                        cur,
                        ctx,
                        |t| t.ident_text().is_some(),
                        "an alias identifier",
                        None,
                    ) {
                        alias = alias_tok.token.ident_text().map(str::to_string);
                    }
                }
                Token::LeftParen => {
                    options = self.parse_paren_options(cur, ctx);
                }
                _ => break,
            }
        }
        self.eat_semicolon(cur);

        if !at_project_scope {
            self.error_at(
                ctx,
                kw.span,
                ErrorCode::E202,
                "`auth` is only legal at project scope",
                "auth blocks cannot be declared inside a router",
                Some("move this block above the first router"),
            );
            return;
        }

        let Some(auth_type) = auth_type else {
            self.error_at(
                ctx,
                type_tok.span,
                ErrorCode::E210,
                format!("unknown authentication type `{type_text}`"),
                "expected `Bearer` or `API-Key`",
                None,
            );
            return;
        };

        let source = match options.get("source").and_then(OptionValue::as_str) {
            Some(value) => match AuthSource::parse(value) {
                Some(source) => source,
                None => {
                    self.error_at(
                        ctx,
                        type_tok.span,
                        ErrorCode::E203,
                        format!("invalid auth source `{value}`"),
                        "must be `header`, `body`, or `query`",
                        None,
                    );
                    AuthSource::Header
                }
            },
            None => {
                self.error_at(
                    ctx,
                    type_tok.span,
                    ErrorCode::E203,
                    "auth block is missing its `source` option",
                    "add `source: header`, `body`, or `query`",
                    None,
                );
                AuthSource::Header
            }
        };

        let field = match options.get("field").and_then(OptionValue::as_str) {
            Some(field) => field.to_string(),
            // Bearer tokens default to the Authorization header; API keys
            // have no conventional field and must name one.
            None if auth_type == AuthType::Bearer => "Authorization".to_string(),
            None => {
                self.error_at(
                    ctx,
                    type_tok.span,
                    ErrorCode::E204,
                    "auth block is missing its `field` option",
                    "name the field holding the key, e.g. `field: \"X-Api-Key\"`",
                    None,
                );
                String::new()
            }
        };

        let default_access = match options.get("defaultAccess").and_then(OptionValue::as_str) {
            None => DefaultAccess::Public,
            Some("public") => DefaultAccess::Public,
            Some("authenticated") => DefaultAccess::Authenticated,
            Some(other) => {
                self.error_at(
                    ctx,
                    type_tok.span,
                    ErrorCode::E208,
                    format!("invalid defaultAccess value `{other}`"),
                    "must be `public` or `authenticated`",
                    None,
                );
                DefaultAccess::Public
            }
        };

        let block = AuthBlock {
            auth_type,
            source,
            field,
            alias,
            default_access,
            options,
            authorization_in_use: false,
            pos: ctx.position(kw.span.union(type_tok.span)),
        };
        let identity = block.identity().to_string();

        if let Some(existing) = scope.auth_blocks.get(&identity) {
            let diag = Diagnostic::error(format!(
                "auth block `{identity}` is defined multiple times"
            ))
            .with_code(ErrorCode::E200)
            .with_label(type_tok.span, "duplicate definition")
            .with_secondary_label(existing.pos.span, "first defined here")
            .with_help("give one of the blocks a distinct alias with `as`")
            .in_file(&ctx.display);
            self.collector.emit(diag);
            return;
        }

        if block.default_access == DefaultAccess::Authenticated
            && scope
                .auth_blocks
                .values()
                .any(|b| b.default_access == DefaultAccess::Authenticated)
        {
            self.error_at(
                ctx,
                type_tok.span,
                ErrorCode::E201,
                "Only one default authentication block can be defined",
                "a default block already exists",
                Some("set `defaultAccess: public` on all but one block"),
            );
            return;
        }

        scope.auth_blocks.insert(identity, block);
    }

    /// `include := "include" STRING ";"`
    fn parse_include(
        &mut self,
        cur: &mut Cursor<'_>,
        ctx: &FileContext,
        scope: &mut ProjectScope,
        router: &mut Router,
        at_project_scope: bool,
    ) {
        cur.advance();
        let Some(path_tok) = self.expect(
            cur,
            ctx,
            |t| matches!(t, Token::Str(_)),
            "a quoted file path",
            Some("e.g. `include \"routes/users.ymr\";`"),
        ) else {
            self.skip_statement(cur);
            return;
        };
        let Token::Str(relative) = &path_tok.token else {
            unreachable!("expect() checked the token kind");
        };
        self.eat_semicolon(cur);

        let target = ctx.dir.join(relative);
        debug!(file = target.display().to_string(); "Resolving include");

        let Some((sub_ctx, sub_tokens)) = self.load_file(&target, Some((path_tok.span, ctx)))
        else {
            return;
        };

        // The included file's items become siblings in the current router.
        let mut sub_cursor = Cursor::new(&sub_tokens);
        self.parse_items(&mut sub_cursor, &sub_ctx, scope, router, at_project_scope);
        self.consume_trailing(&mut sub_cursor, &sub_ctx);
        self.stack.pop();
    }

    // =====================================================================
    // Options
    // =====================================================================

    /// `"(" option_pair { "," option_pair } ")"`
    fn parse_paren_options(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> OptionMap {
        if self
            .expect(cur, ctx, |t| matches!(t, Token::LeftParen), "`(`", None)
            .is_none()
        {
            return OptionMap::new();
        }
        self.parse_option_args(cur, ctx, |t| matches!(t, Token::RightParen), "`)`")
    }

    /// Parse option pairs up to (and including) the closing token.
    fn parse_option_args(
        &mut self,
        cur: &mut Cursor<'_>,
        ctx: &FileContext,
        closes: impl Fn(&Token) -> bool + Copy,
        closing: &str,
    ) -> OptionMap {
        let mut map = OptionMap::new();

        if closes(cur.peek_token()) {
            cur.advance();
            return map;
        }

        loop {
            let Some(key_tok) = self.expect(
                cur,
                ctx,
                |t| t.ident_text().is_some(),
                "an option name",
                None,
            ) else {
                // Resync: drop tokens until the list closes.
                while !closes(cur.peek_token()) && !cur.at_eof() {
                    cur.advance();
                }
                if closes(cur.peek_token()) {
                    cur.advance();
                }
                return map;
            };
            let key = key_tok.token.ident_text().unwrap_or_default().to_string();

            self.expect(cur, ctx, |t| matches!(t, Token::Colon), "`:`", None);
            let value = self.parse_option_value(cur, ctx);

            if map.contains_key(&key) {
                // First occurrence wins; duplicates are dropped.
                self.error_at(
                    ctx,
                    key_tok.span,
                    ErrorCode::E100,
                    format!("option `{key}` given twice"),
                    "already set",
                    None,
                );
            } else {
                map.insert(key, value);
            }

            match cur.peek_token() {
                Token::Comma => {
                    cur.advance();
                }
                token if closes(token) => {
                    cur.advance();
                    break;
                }
                _ => {
                    let tok = cur.peek();
                    self.error_at(
                        ctx,
                        tok.span,
                        ErrorCode::E100,
                        format!("expected `,` or {closing}, found {}", tok.token.describe()),
                        "while reading options",
                        None,
                    );
                    break;
                }
            }
        }

        map
    }

    /// `option_value := STRING | NUMBER | BOOL | word | "@" global | map | list`
    fn parse_option_value(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> OptionValue {
        match cur.peek_token() {
            Token::Str(value) => {
                let value = value.clone();
                cur.advance();
                OptionValue::String(value)
            }
            Token::Number(value) => {
                let value = *value;
                cur.advance();
                OptionValue::Number(value)
            }
            Token::Bool(value) => {
                let value = *value;
                cur.advance();
                OptionValue::Bool(value)
            }
            Token::At => {
                cur.advance();
                self.parse_global(cur, ctx)
            }
            Token::LeftBrace => {
                cur.advance();
                let map =
                    self.parse_option_args(cur, ctx, |t| matches!(t, Token::RightBrace), "`}`");
                OptionValue::Map(map)
            }
            Token::LeftBracket => {
                cur.advance();
                self.parse_option_list(cur, ctx)
            }
            token if token.ident_text().is_some() => {
                // Bare words (type keywords, `public`, `authenticated`, ...)
                // read as string values.
                let value = token.ident_text().unwrap_or_default().to_string();
                cur.advance();
                OptionValue::String(value)
            }
            other => {
                let span = cur.peek().span;
                self.error_at(
                    ctx,
                    span,
                    ErrorCode::E100,
                    format!("expected an option value, found {}", other.describe()),
                    "not a value",
                    None,
                );
                cur.advance();
                OptionValue::String(String::new())
            }
        }
    }

    /// `"@" IDENT { "." IDENT }` — already past the `@`.
    fn parse_global(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> OptionValue {
        let Some(name_tok) = self.expect(
            cur,
            ctx,
            |t| t.ident_text().is_some(),
            "a global variable name",
            Some("e.g. `@env.PORT`"),
        ) else {
            return OptionValue::String(String::new());
        };
        let name = name_tok.token.ident_text().unwrap_or_default().to_string();

        let mut path = Vec::new();
        while matches!(cur.peek_token(), Token::Dot) {
            cur.advance();
            let Some(part_tok) = self.expect(
                cur,
                ctx,
                |t| t.ident_text().is_some(),
                "a member name after `.`",
                None,
            ) else {
                break;
            };
            path.push(part_tok.token.ident_text().unwrap_or_default().to_string());
        }

        OptionValue::Global(GlobalVariable::new(name, path))
    }

    /// `"[" option_value { "," option_value } "]"` — already past the `[`.
    fn parse_option_list(&mut self, cur: &mut Cursor<'_>, ctx: &FileContext) -> OptionValue {
        let mut items = Vec::new();
        if matches!(cur.peek_token(), Token::RightBracket) {
            cur.advance();
            return OptionValue::List(items);
        }

        loop {
            items.push(self.parse_option_value(cur, ctx));
            match cur.peek_token() {
                Token::Comma => {
                    cur.advance();
                }
                Token::RightBracket => {
                    cur.advance();
                    break;
                }
                _ => {
                    let tok = cur.peek();
                    self.error_at(
                        ctx,
                        tok.span,
                        ErrorCode::E100,
                        format!("expected `,` or `]`, found {}", tok.token.describe()),
                        "while reading a list",
                        None,
                    );
                    break;
                }
            }
        }

        OptionValue::List(items)
    }
}
