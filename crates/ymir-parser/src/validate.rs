//! Post-parse validation of the project.
//!
//! The grammar allows `authenticate` clauses to name auth blocks that are
//! declared later in the file (or in another included file), so the
//! block references are resolved here, after the whole project has been
//! parsed:
//!
//! - an unnamed `authenticate` resolves to the project's single auth
//!   block, or is an error when the project has zero or several blocks;
//! - a named clause must reference a declared block;
//! - any clause carrying `with [roles...]` flips the referenced block's
//!   `authorization_in_use` flag.
//!
//! This is the only mutation the AST sees after parsing; emitters treat
//! the model as immutable.

use ymir_core::auth::AuthenticateClause;
use ymir_core::router::{Project, Router};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode};

/// Resolve every authenticate clause against the project's auth blocks.
pub(crate) fn resolve_auth_references(project: &mut Project, collector: &mut DiagnosticCollector) {
    let single_identity = if project.auth_blocks.len() == 1 {
        project.auth_blocks.keys().next().cloned()
    } else {
        None
    };
    let block_count = project.auth_blocks.len();

    let Project {
        ref mut auth_blocks,
        ref mut root,
        ..
    } = *project;

    walk(root, &mut |clause| {
        if clause.block.is_empty() {
            match &single_identity {
                Some(identity) => clause.block = identity.clone(),
                None => {
                    collector.emit(
                        Diagnostic::error(format!(
                            "`authenticate` without an identifier requires exactly one \
                             auth block, but the project defines {block_count}"
                        ))
                        .with_code(ErrorCode::E205)
                        .with_label(clause.pos.span, "ambiguous reference")
                        .with_help("name the auth block: `authenticate <name>`")
                        .in_file(clause.pos.file.clone().unwrap_or_default()),
                    );
                    return;
                }
            }
        }

        match auth_blocks.get_mut(&clause.block) {
            Some(block) => {
                if !clause.roles.is_empty() {
                    block.authorization_in_use = true;
                }
            }
            None => {
                collector.emit(
                    Diagnostic::error(format!("unknown auth block `{}`", clause.block))
                        .with_code(ErrorCode::E206)
                        .with_label(clause.pos.span, "no auth block with this identity")
                        .with_help("declare it with `auth <Type> as <name> (...)`")
                        .in_file(clause.pos.file.clone().unwrap_or_default()),
                );
            }
        }
    });
}

fn walk(router: &mut Router, visit: &mut impl FnMut(&mut AuthenticateClause)) {
    if let Some(clause) = router.authenticate.as_mut() {
        visit(clause);
    }
    for route in &mut router.routes {
        if let Some(clause) = route.authenticate.as_mut() {
            visit(clause);
        }
    }
    for child in &mut router.routers {
        walk(child, visit);
    }
}
