//! # Ymir Core
//!
//! The semantic model for the Ymir REST DSL. This crate defines the AST
//! produced by the parser and consumed by the code emitters:
//!
//! - [`Project`](router::Project), [`Router`](router::Router) and
//!   [`Route`](route::Route) — the routing tree
//! - [`Path`](path::Path) and [`QueryParameter`](path::QueryParameter)
//! - [`OptionValue`](option::OptionValue) — the recursive middleware
//!   option tree
//! - [`AuthBlock`](auth::AuthBlock) and
//!   [`AuthenticateClause`](auth::AuthenticateClause)
//! - [`RenderBlock`](render::RenderBlock) — frontend rendering directives
//!
//! It also provides the derived views shared by all emitters: effective
//! header/body schemas, effective authenticate clauses, alias lookup, and
//! the deterministic option hash used for DTO deduplication.
//!
//! The model is built once per compile and is immutable during emission.

pub mod auth;
pub mod hash;
pub mod ident;
pub mod option;
pub mod path;
pub mod render;
pub mod route;
pub mod router;
pub mod span;

pub use auth::{AuthBlock, AuthSource, AuthType, AuthenticateClause, BearerMode, DefaultAccess};
pub use option::{GlobalVariable, OptionMap, OptionValue};
pub use path::{ParamType, Path, QueryParameter};
pub use render::{RenderBlock, RenderKind};
pub use route::{Method, Route};
pub use router::{Middleware, Project, Router};
pub use span::{SourcePosition, Span};
