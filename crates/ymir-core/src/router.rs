//! Routers, middlewares, and the project root.
//!
//! A [`Project`] hoists the project-only data (target name, middlewares,
//! auth blocks) next to a root [`Router`] instead of inheriting from it;
//! descendants inherit header/body schemas and authenticate clauses through
//! the derived views defined here.

use indexmap::IndexMap;

use crate::auth::{AuthBlock, AuthenticateClause, DefaultAccess};
use crate::option::{OptionMap, merge_options};
use crate::path::{Path, join_paths};
use crate::route::Route;
use crate::span::SourcePosition;

/// A project-wide `use` directive.
#[derive(Debug, Clone)]
pub struct Middleware {
    pub name: String,
    pub options: OptionMap,
    pub pos: SourcePosition,
}

/// A router node: a path prefix with child routers and routes.
#[derive(Debug, Clone)]
pub struct Router {
    pub path: Path,
    pub routers: Vec<Router>,
    pub routes: Vec<Route>,
    /// Header schema inherited by all descendants.
    pub header: Option<OptionMap>,
    /// Body schema inherited by all descendants.
    pub body: Option<OptionMap>,
    /// Authenticate clause inherited by all descendants.
    pub authenticate: Option<AuthenticateClause>,
    pub pos: SourcePosition,
}

impl Router {
    pub fn new(path: Path, pos: SourcePosition) -> Self {
        Self {
            path,
            routers: Vec::new(),
            routes: Vec::new(),
            header: None,
            body: None,
            authenticate: None,
            pos,
        }
    }

    /// This router's header schema merged over the inherited one,
    /// this router's keys winning.
    pub fn effective_header(&self, inherited: &OptionMap) -> OptionMap {
        match &self.header {
            Some(own) => merge_options(inherited, own),
            None => inherited.clone(),
        }
    }

    /// This router's body schema merged over the inherited one.
    pub fn effective_body(&self, inherited: &OptionMap) -> OptionMap {
        match &self.body {
            Some(own) => merge_options(inherited, own),
            None => inherited.clone(),
        }
    }

    /// The authenticate clause in effect for this router's children:
    /// its own clause if present, else the inherited one.
    pub fn effective_authenticate<'a>(
        &'a self,
        inherited: Option<&'a AuthenticateClause>,
    ) -> Option<&'a AuthenticateClause> {
        self.authenticate.as_ref().or(inherited)
    }

    fn find_by_alias_from<'a>(&'a self, prefix: &str, alias: &str) -> Option<(&'a Route, String)> {
        let here = join_paths(prefix, &self.path.raw);
        for route in &self.routes {
            if route.path.alias.as_deref() == Some(alias) {
                return Some((route, here.clone()));
            }
        }
        for child in &self.routers {
            if let Some(found) = child.find_by_alias_from(&here, alias) {
                return Some(found);
            }
        }
        None
    }
}

/// The compiled project: the root router plus project-scoped data.
#[derive(Debug, Clone)]
pub struct Project {
    /// Target name from the `target` declaration.
    pub target: String,
    /// Project-wide middlewares, in declaration order.
    pub middlewares: Vec<Middleware>,
    /// Auth blocks keyed by identity, in declaration order.
    pub auth_blocks: IndexMap<String, AuthBlock>,
    /// The project node itself acts as the root router (path `/`).
    pub root: Router,
    pub pos: SourcePosition,
}

impl Project {
    pub fn new(target: impl Into<String>, pos: SourcePosition) -> Self {
        let root_pos = pos.clone();
        Self {
            target: target.into(),
            middlewares: Vec::new(),
            auth_blocks: IndexMap::new(),
            root: Router::new(Path::new("/", root_pos.clone()), root_pos),
            pos,
        }
    }

    /// Look up an auth block by the identity carried in a clause.
    pub fn auth_block(&self, identity: &str) -> Option<&AuthBlock> {
        self.auth_blocks.get(identity)
    }

    /// The block marked `defaultAccess: authenticated`, if any.
    pub fn default_auth_block(&self) -> Option<&AuthBlock> {
        self.auth_blocks
            .values()
            .find(|block| block.default_access == DefaultAccess::Authenticated)
    }

    /// A synthesized clause for the project's default auth block.
    ///
    /// Applied to routes that carry no explicit or inherited clause.
    pub fn default_auth_clause(&self) -> Option<AuthenticateClause> {
        self.default_auth_block()
            .map(|block| AuthenticateClause::new(block.identity(), block.pos.clone()))
    }

    /// Resolve the clause that actually governs a route: the explicit or
    /// inherited clause if present, else the project default.
    pub fn resolve_authenticate<'a>(
        &'a self,
        route: &'a Route,
        inherited: Option<&'a AuthenticateClause>,
    ) -> Option<AuthenticateClause> {
        route
            .authenticate
            .as_ref()
            .or(inherited)
            .cloned()
            .or_else(|| self.default_auth_clause())
    }

    /// Recursive search for a route by alias.
    ///
    /// Returns the route together with the fully-qualified path of its
    /// parent router chain (segments joined with `/`, collapsed).
    pub fn find_route_by_alias<'a>(&'a self, alias: &str) -> Option<(&'a Route, String)> {
        self.root.find_by_alias_from("", alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::OptionValue;
    use crate::route::Method;

    fn map(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OptionValue::String(v.to_string())))
            .collect()
    }

    fn route(raw: &str, alias: Option<&str>) -> Route {
        let mut path = Path::new(raw, SourcePosition::unknown());
        path.alias = alias.map(str::to_string);
        Route::new(Method::Get, path, SourcePosition::unknown())
    }

    #[test]
    fn test_effective_header_merges_down() {
        let mut router = Router::new(
            Path::new("/api", SourcePosition::unknown()),
            SourcePosition::unknown(),
        );
        router.header = Some(map(&[("X-Token", "string"), ("X-Version", "int")]));

        let inherited = map(&[("X-Token", "any"), ("X-Trace", "string")]);
        let effective = router.effective_header(&inherited);

        assert_eq!(effective.len(), 3);
        // Descendant key wins over the ancestor's.
        assert_eq!(
            effective["X-Token"],
            OptionValue::String("string".to_string())
        );
        assert_eq!(
            effective["X-Trace"],
            OptionValue::String("string".to_string())
        );
    }

    #[test]
    fn test_effective_header_without_own_schema() {
        let router = Router::new(
            Path::new("/api", SourcePosition::unknown()),
            SourcePosition::unknown(),
        );
        let inherited = map(&[("X-Token", "string")]);
        assert_eq!(router.effective_header(&inherited), inherited);
    }

    #[test]
    fn test_find_route_by_alias_qualifies_parent_path() {
        let mut project = Project::new("JavaScript_ExpressJS", SourcePosition::unknown());
        let mut api = Router::new(
            Path::new("/api", SourcePosition::unknown()),
            SourcePosition::unknown(),
        );
        let mut users = Router::new(
            Path::new("/users", SourcePosition::unknown()),
            SourcePosition::unknown(),
        );
        users.routes.push(route("/:id", Some("UserById")));
        api.routers.push(users);
        project.root.routers.push(api);

        let (found, parent) = project.find_route_by_alias("UserById").unwrap();
        assert_eq!(found.path.raw, "/:id");
        assert_eq!(parent, "/api/users");

        assert!(project.find_route_by_alias("Nope").is_none());
    }

    #[test]
    fn test_resolve_authenticate_falls_back_to_default() {
        use crate::auth::{AuthSource, AuthType};

        let mut project = Project::new("T", SourcePosition::unknown());
        project.auth_blocks.insert(
            "apiKey".to_string(),
            AuthBlock {
                auth_type: AuthType::Bearer,
                source: AuthSource::Header,
                field: "Authorization".to_string(),
                alias: Some("apiKey".to_string()),
                default_access: DefaultAccess::Authenticated,
                options: OptionMap::new(),
                authorization_in_use: false,
                pos: SourcePosition::unknown(),
            },
        );

        let plain = route("/me", Some("Me"));
        let clause = project.resolve_authenticate(&plain, None).unwrap();
        assert_eq!(clause.block, "apiKey");

        // An explicit clause wins over the default.
        let mut explicit = route("/other", None);
        explicit.authenticate = Some(AuthenticateClause::new(
            "other",
            SourcePosition::unknown(),
        ));
        let clause = project.resolve_authenticate(&explicit, None).unwrap();
        assert_eq!(clause.block, "other");
    }
}
