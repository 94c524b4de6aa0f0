//! Authentication blocks and authenticate clauses.
//!
//! An [`AuthBlock`] is a project-scoped description of an authentication
//! scheme. Routes and routers reference blocks through
//! [`AuthenticateClause`]s carrying the block's identity string; the
//! back-reference is resolved against the project's block map at emission
//! time rather than through owning pointers.

use std::fmt;

use crate::ident;
use crate::option::OptionMap;
use crate::span::SourcePosition;

/// The authentication scheme of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    ApiKey,
    Bearer,
}

impl AuthType {
    /// Parse the scheme name as written in scripts.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "API-Key" | "APIKey" => Some(AuthType::ApiKey),
            "Bearer" => Some(AuthType::Bearer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::ApiKey => "API-Key",
            AuthType::Bearer => "Bearer",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the credential is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    Header,
    Body,
    Query,
}

impl AuthSource {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "header" => Some(AuthSource::Header),
            "body" => Some(AuthSource::Body),
            "query" => Some(AuthSource::Query),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthSource::Header => "header",
            AuthSource::Body => "body",
            AuthSource::Query => "query",
        }
    }
}

impl fmt::Display for AuthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of the bearer token lifecycle the generated code owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BearerMode {
    /// The subclass validates raw tokens itself.
    #[default]
    None,
    /// The subclass validates and generates tokens; login wiring is emitted.
    Basic,
    /// Token signing and verification are fully generated.
    Full,
}

impl BearerMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "NONE" => Some(BearerMode::None),
            "BASIC" => Some(BearerMode::Basic),
            "FULL" => Some(BearerMode::Full),
            _ => None,
        }
    }
}

/// Whether routes default to public or authenticated access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultAccess {
    #[default]
    Public,
    /// Marks the block as the project-wide default authentication.
    Authenticated,
}

/// A project-scoped authentication block.
#[derive(Debug, Clone)]
pub struct AuthBlock {
    pub auth_type: AuthType,
    pub source: AuthSource,
    /// Token to extract from the source (header name, body field, ...).
    pub field: String,
    pub alias: Option<String>,
    pub default_access: DefaultAccess,
    pub options: OptionMap,
    /// Set during parsing when any clause references this block
    /// `with [roles...]`. Never mutated after parsing.
    pub authorization_in_use: bool,
    pub pos: SourcePosition,
}

impl AuthBlock {
    /// The block's identity: its alias if present, else the scheme name.
    pub fn identity(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.auth_type.as_str(),
        }
    }

    /// Identifier-sanitized identity with the first letter capitalized,
    /// used in generated method names (`authenticateApiKey`, ...).
    pub fn display_name(&self) -> String {
        ident::display_name(self.identity())
    }

    /// The bearer mode requested by the block's `mode` option, if any.
    pub fn bearer_mode(&self) -> Option<BearerMode> {
        self.options
            .get("mode")
            .and_then(|v| v.as_str())
            .and_then(BearerMode::parse)
    }

    /// `true` when the block asks for a logout endpoint.
    pub fn with_logout(&self) -> bool {
        self.options
            .get("withLogout")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Login path for Basic/Full bearer modes.
    pub fn login_path(&self) -> String {
        self.options
            .get("loginPath")
            .and_then(|v| v.as_str())
            .unwrap_or("/login")
            .to_string()
    }

    /// Logout path for Basic/Full bearer modes.
    pub fn logout_path(&self) -> String {
        self.options
            .get("logoutPath")
            .and_then(|v| v.as_str())
            .unwrap_or("/logout")
            .to_string()
    }

    /// Field holding the user name in login requests.
    pub fn username_field(&self) -> String {
        self.options
            .get("usernameField")
            .and_then(|v| v.as_str())
            .unwrap_or("username")
            .to_string()
    }

    /// Field holding the password in login requests.
    pub fn password_field(&self) -> String {
        self.options
            .get("passwordField")
            .and_then(|v| v.as_str())
            .unwrap_or("password")
            .to_string()
    }
}

/// A per-route or per-router reference to an auth block.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticateClause {
    /// Identity of the referenced block; resolved against
    /// [`Project::auth_blocks`](crate::router::Project::auth_blocks).
    pub block: String,
    /// Role literals given with `with [...]`. Empty when no authorization
    /// was requested.
    pub roles: Vec<String>,
    pub pos: SourcePosition,
}

impl AuthenticateClause {
    pub fn new(block: impl Into<String>, pos: SourcePosition) -> Self {
        Self {
            block: block.into(),
            roles: Vec::new(),
            pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(auth_type: AuthType, alias: Option<&str>) -> AuthBlock {
        AuthBlock {
            auth_type,
            source: AuthSource::Header,
            field: "Authorization".to_string(),
            alias: alias.map(str::to_string),
            default_access: DefaultAccess::Public,
            options: OptionMap::new(),
            authorization_in_use: false,
            pos: SourcePosition::unknown(),
        }
    }

    #[test]
    fn test_identity_prefers_alias() {
        assert_eq!(block(AuthType::Bearer, Some("apiKey")).identity(), "apiKey");
        assert_eq!(block(AuthType::Bearer, None).identity(), "Bearer");
        assert_eq!(block(AuthType::ApiKey, None).identity(), "API-Key");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(block(AuthType::Bearer, Some("apiKey")).display_name(), "ApiKey");
        assert_eq!(block(AuthType::ApiKey, None).display_name(), "APIKey");
    }

    #[test]
    fn test_bearer_mode_from_options() {
        let mut b = block(AuthType::Bearer, None);
        assert_eq!(b.bearer_mode(), None);

        b.options.insert(
            "mode".to_string(),
            crate::option::OptionValue::String("FULL".to_string()),
        );
        assert_eq!(b.bearer_mode(), Some(BearerMode::Full));
    }

    #[test]
    fn test_login_logout_defaults() {
        let b = block(AuthType::Bearer, None);
        assert_eq!(b.login_path(), "/login");
        assert_eq!(b.logout_path(), "/logout");
        assert_eq!(b.username_field(), "username");
        assert_eq!(b.password_field(), "password");
    }
}
