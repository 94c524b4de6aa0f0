//! Express/JavaScript emitter.
//!
//! Produces a single file declaring the validation helpers, the message
//! constants, the `express` application, a `YmirRestBase` class with one
//! async handler per route and one private authentication method per auth
//! block, a `build(app)` method wiring routers and routes, and an exported
//! `startServer` function.
//!
//! A subclass overrides the route handlers, calls `super` to run
//! validation and authentication, and implements the business logic when
//! `super` returned `true`.

use log::debug;

use ymir_core::auth::{AuthBlock, AuthSource, AuthType, AuthenticateClause, BearerMode};
use ymir_core::option::{OptionMap, OptionValue};
use ymir_core::route::Route;
use ymir_core::router::{Project, Router};

use crate::writer::CodeWriter;
use crate::{EmitError, Emitter, EmitterConfig, GeneratedFile};

/// Name of the single generated file.
const OUTPUT_FILE: &str = "YmirRestBase.js";

pub struct ExpressEmitter {
    config: EmitterConfig,
}

impl ExpressEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    fn bearer_mode(&self, block: &AuthBlock) -> BearerMode {
        block.bearer_mode().unwrap_or(self.config.bearer.as_mode())
    }
}

/// Everything a route handler needs, resolved against its ancestors.
struct HandlerPlan<'a> {
    route: &'a Route,
    /// `onApiHello`
    name: String,
    eff_header: OptionMap,
    eff_body: OptionMap,
    clause: Option<AuthenticateClause>,
}

impl Emitter for ExpressEmitter {
    fn target(&self) -> &'static str {
        "JavaScript_ExpressJS"
    }

    fn emit(&self, project: &Project) -> Result<Vec<GeneratedFile>, EmitError> {
        debug!(emitter = self.target(); "Emitting project");

        // Reject combinations this target cannot express before writing
        // anything.
        for block in project.auth_blocks.values() {
            if block.auth_type == AuthType::Bearer && block.source != AuthSource::Header {
                return Err(EmitError::Unsupported {
                    what: format!(
                        "Bearer auth block `{}` must source its token from `header`",
                        block.identity()
                    ),
                    at: block.pos.to_string(),
                });
            }
        }

        let middlewares = MiddlewarePlan::resolve(project)?;
        let handlers = collect_handlers(project);
        let full_blocks: Vec<&AuthBlock> = project
            .auth_blocks
            .values()
            .filter(|b| b.auth_type == AuthType::Bearer && self.bearer_mode(b) == BearerMode::Full)
            .collect();

        let mut w = CodeWriter::new();
        w.line("// Generated by the Ymir compiler. Do not edit.");
        w.line("\"use strict\";");
        w.blank();
        w.line("const express = require(\"express\");");
        if !full_blocks.is_empty() {
            w.line("const jwt = require(\"jsonwebtoken\");");
        }
        if middlewares.cors.is_some() {
            w.line("const cors = require(\"cors\");");
        }
        if middlewares.env {
            w.line("require(\"dotenv\").config();");
        }
        w.blank();

        write_messages(&mut w);
        write_validators(&mut w);

        for block in &full_blocks {
            w.line(format!(
                "const {} = {};",
                secret_const(block),
                secret_value(block)
            ));
        }
        if !full_blocks.is_empty() {
            w.blank();
        }

        w.line("const app = express();");
        if middlewares.json {
            w.line("app.use(express.json());");
        }
        match &middlewares.cors {
            Some(Some(origin)) => w.line(format!("app.use(cors({{ origin: {origin} }}));")),
            Some(None) => w.line("app.use(cors());"),
            None => {}
        }
        w.blank();

        w.open("class YmirRestBase {");
        write_shared_helpers(&mut w);

        for handler in &handlers {
            self.write_handler(&mut w, handler, project)?;
        }

        for block in project.auth_blocks.values() {
            self.write_auth_handler(&mut w, block);
        }

        self.write_build(&mut w, project)?;
        w.close("}");
        w.blank();

        w.open("function startServer(handler, port = process.env.PORT || 3000) {");
        w.line("handler.build(app);");
        w.open("app.listen(port, () => {");
        w.line("console.log(MESSAGES.Started.replace(\"{0}\", String(port)));");
        w.close("});");
        w.line("return app;");
        w.close("}");
        w.blank();
        w.line("module.exports = { YmirRestBase, startServer, app };");

        Ok(vec![GeneratedFile::new(OUTPUT_FILE, w.finish())])
    }
}

impl ExpressEmitter {
    /// One `async on<Chain><Name>(req, res)` handler.
    fn write_handler(
        &self,
        w: &mut CodeWriter,
        plan: &HandlerPlan<'_>,
        project: &Project,
    ) -> Result<(), EmitError> {
        if let Some(description) = &plan.route.description {
            w.line(format!("// {description}"));
        }
        w.open(format!("async {}(req, res) {{", plan.name));

        for (name, value) in &plan.eff_header {
            w.line(format!(
                "if (!this.#requireHeader(req, res, {}, VALIDATORS[{}])) return false;",
                js_string(name),
                js_string(validator_key(value)),
            ));
        }

        for param in &plan.route.path.query {
            w.line(format!(
                "if (!this.#requireQuery(req, res, {}, VALIDATORS[{}])) return false;",
                js_string(&param.name),
                js_string(param.ty.as_str()),
            ));
        }

        if !plan.eff_body.is_empty() {
            w.line(format!(
                "if (!this.#checkBody(res, req.body, {}, \"\")) return false;",
                js_schema(&plan.eff_body),
            ));
        }

        if let Some(clause) = &plan.clause {
            let block = project
                .auth_block(&clause.block)
                .ok_or_else(|| EmitError::UnknownAuthBlock(clause.block.clone()))?;
            let name = block.display_name();
            w.line(format!(
                "const credential = await this.#handle{name}Authentication(req, res);"
            ));
            w.line("if (credential === null) return false;");
            if !clause.roles.is_empty() {
                w.open(format!(
                    "if (!(await this.authorize{name}(credential, {}))) {{",
                    js_string_array(&clause.roles),
                ));
                w.line("res.status(403).send(MESSAGES._403);");
                w.line("return false;");
                w.close("}");
            }
        }

        w.line("return true;");
        w.close("}");
        w.blank();
        Ok(())
    }

    /// One `#handle<Name>Authentication(req, res)` private method.
    ///
    /// Returns the accepted credential (key, token, or decoded payload),
    /// or `null` after responding 401.
    fn write_auth_handler(&self, w: &mut CodeWriter, block: &AuthBlock) {
        let name = block.display_name();
        w.open(format!("async #handle{name}Authentication(req, res) {{"));

        match block.auth_type {
            AuthType::ApiKey => {
                w.line(format!(
                    "const raw = {};",
                    extract_credential(block.source, &block.field)
                ));
                w.open(format!(
                    "if (raw === undefined || !(await this.authenticate{name}(String(raw)))) {{"
                ));
                w.line("res.status(401).send(MESSAGES._401);");
                w.line("return null;");
                w.close("}");
                w.line("return String(raw);");
            }
            AuthType::Bearer => {
                w.line(format!(
                    "const raw = getHeader(req.headers, {});",
                    js_string(&block.field)
                ));
                w.line(
                    "const token = raw === undefined ? undefined : \
                     String(raw).replace(/^Bearer /, \"\");",
                );
                w.open("if (token === undefined) {");
                w.line("res.status(401).send(MESSAGES._401);");
                w.line("return null;");
                w.close("}");

                match self.bearer_mode(block) {
                    BearerMode::None => {
                        w.open(format!("if (!(await this.authenticate{name}(token))) {{"));
                        w.line("res.status(401).send(MESSAGES._401);");
                        w.line("return null;");
                        w.close("}");
                        w.line("return token;");
                    }
                    BearerMode::Basic => {
                        w.open(format!("if (!(await this.validateJwtFor{name}(token))) {{"));
                        w.line("res.status(401).send(MESSAGES._401);");
                        w.line("return null;");
                        w.close("}");
                        w.line("return token;");
                    }
                    BearerMode::Full => {
                        w.line("let payload;");
                        w.open("try {");
                        w.line(format!(
                            "payload = jwt.verify(token, {});",
                            secret_const(block)
                        ));
                        w.close("} catch (err) {");
                        w.indent();
                        w.line("res.status(401).send(MESSAGES._401);");
                        w.line("return null;");
                        w.close("}");
                        w.open(format!(
                            "if (!(await this.validateJwtPayloadFor{name}(payload))) {{"
                        ));
                        w.line("res.status(401).send(MESSAGES._401);");
                        w.line("return null;");
                        w.close("}");
                        w.line("return payload;");
                    }
                }
            }
        }

        w.close("}");
        w.blank();
    }

    /// The `build(app)` wiring method.
    fn write_build(&self, w: &mut CodeWriter, project: &Project) -> Result<(), EmitError> {
        w.open("build(app) {");

        let empty = OptionMap::new();
        for child in &project.root.routers {
            self.write_router_wiring(w, project, child, "app", "", &empty, &empty, None)?;
        }
        for route in &project.root.routes {
            write_route_wiring(w, "app", "", route);
        }

        for block in project.auth_blocks.values() {
            if block.auth_type != AuthType::Bearer {
                continue;
            }
            match self.bearer_mode(block) {
                BearerMode::None => {}
                mode @ (BearerMode::Basic | BearerMode::Full) => {
                    self.write_login_wiring(w, block, mode);
                }
            }
        }

        w.close("}");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_router_wiring(
        &self,
        w: &mut CodeWriter,
        project: &Project,
        router: &Router,
        parent_var: &str,
        parent_chain: &str,
        inh_header: &OptionMap,
        inh_body: &OptionMap,
        inh_clause: Option<&AuthenticateClause>,
    ) -> Result<(), EmitError> {
        let chain = format!("{parent_chain}{}", router.path.display_name());
        let var = router_var(&chain);
        let eff_header = router.effective_header(inh_header);
        let eff_body = router.effective_body(inh_body);
        let clause = router.effective_authenticate(inh_clause);

        w.line(format!("const {var} = express.Router();"));

        if !eff_header.is_empty() || !eff_body.is_empty() {
            w.open(format!("{var}.use((req, res, next) => {{"));
            for (name, value) in &eff_header {
                w.line(format!(
                    "if (!this.#requireHeader(req, res, {}, VALIDATORS[{}])) return;",
                    js_string(name),
                    js_string(validator_key(value)),
                ));
            }
            if !eff_body.is_empty() {
                w.line(format!(
                    "if (!this.#checkBody(res, req.body, {}, \"\")) return;",
                    js_schema(&eff_body),
                ));
            }
            w.line("next();");
            w.close("});");
        }

        if let Some(clause) = clause {
            let block = project
                .auth_block(&clause.block)
                .ok_or_else(|| EmitError::UnknownAuthBlock(clause.block.clone()))?;
            w.open(format!("{var}.use(async (req, res, next) => {{"));
            w.line(format!(
                "if ((await this.#handle{}Authentication(req, res)) === null) return;",
                block.display_name()
            ));
            w.line("next();");
            w.close("});");
        }

        for route in &router.routes {
            write_route_wiring(w, &var, &chain, route);
        }
        for child in &router.routers {
            self.write_router_wiring(
                w,
                project,
                child,
                &var,
                &chain,
                &eff_header,
                &eff_body,
                clause,
            )?;
        }

        w.line(format!(
            "{parent_var}.use({}, {var});",
            js_string(&router.path.raw)
        ));
        Ok(())
    }

    fn write_login_wiring(&self, w: &mut CodeWriter, block: &AuthBlock, mode: BearerMode) {
        let name = block.display_name();
        let login_source = block
            .options
            .get("loginSource")
            .and_then(OptionValue::as_str)
            .and_then(AuthSource::parse)
            .unwrap_or(AuthSource::Body);

        w.open(format!(
            "app.post({}, async (req, res) => {{",
            js_string(&block.login_path())
        ));
        w.line(format!(
            "const username = {};",
            extract_credential(login_source, &block.username_field())
        ));
        w.line(format!(
            "const password = {};",
            extract_credential(login_source, &block.password_field())
        ));
        match mode {
            BearerMode::Basic => {
                w.line(format!(
                    "const token = await this.generateJwtFor{name}(username, password);"
                ));
                w.open("if (!token) {");
                w.line("res.status(401).send(MESSAGES._401);");
                w.line("return;");
                w.close("}");
                w.line("res.json({ token });");
            }
            BearerMode::Full => {
                w.line(format!(
                    "const payload = await this.getJwtPayloadFor{name}(username, password);"
                ));
                w.open("if (!payload) {");
                w.line("res.status(401).send(MESSAGES._401);");
                w.line("return;");
                w.close("}");
                w.line(format!(
                    "res.json({{ token: jwt.sign(payload, {}, {{ expiresIn: {} }}) }});",
                    secret_const(block),
                    expires_in(block),
                ));
            }
            BearerMode::None => unreachable!("login is only wired for Basic and Full"),
        }
        w.close("});");

        if block.with_logout() {
            w.open(format!(
                "app.post({}, async (req, res) => {{",
                js_string(&block.logout_path())
            ));
            w.line(format!(
                "const credential = await this.#handle{name}Authentication(req, res);"
            ));
            w.line("if (credential === null) return;");
            w.line(format!("await this.logout{name}(credential);"));
            w.line("res.status(204).send();");
            w.close("});");
        }
    }
}

/// Project-level middleware directives resolved to emitter actions.
struct MiddlewarePlan {
    env: bool,
    json: bool,
    /// `Some(origin_expr)` when an origin was configured.
    cors: Option<Option<String>>,
}

impl MiddlewarePlan {
    fn resolve(project: &Project) -> Result<Self, EmitError> {
        let mut plan = MiddlewarePlan {
            env: false,
            json: false,
            cors: None,
        };
        for middleware in &project.middlewares {
            match middleware.name.as_str() {
                "env" => plan.env = true,
                "json" => plan.json = true,
                "cors" => {
                    let origin = middleware.options.get("origin").map(js_value);
                    plan.cors = Some(origin);
                }
                other => {
                    return Err(EmitError::UnknownMiddleware {
                        name: other.to_string(),
                        at: middleware.pos.to_string(),
                    });
                }
            }
        }
        Ok(plan)
    }
}

fn collect_handlers(project: &Project) -> Vec<HandlerPlan<'_>> {
    let mut handlers = Vec::new();
    let empty = OptionMap::new();
    collect_router(project, &project.root, "", &empty, &empty, None, &mut handlers);
    handlers
}

fn collect_router<'a>(
    project: &'a Project,
    router: &'a Router,
    chain: &str,
    inh_header: &OptionMap,
    inh_body: &OptionMap,
    inh_clause: Option<&'a AuthenticateClause>,
    out: &mut Vec<HandlerPlan<'a>>,
) {
    let eff_header = router.effective_header(inh_header);
    let eff_body = router.effective_body(inh_body);
    let clause = router.effective_authenticate(inh_clause);

    for route in &router.routes {
        let route_header = match &route.header {
            Some(own) => ymir_core::option::merge_options(&eff_header, own),
            None => eff_header.clone(),
        };
        let route_body = match &route.body {
            Some(own) => ymir_core::option::merge_options(&eff_body, own),
            None => eff_body.clone(),
        };
        out.push(HandlerPlan {
            route,
            name: format!("on{chain}{}", route.path.display_name()),
            eff_header: route_header,
            eff_body: route_body,
            clause: project.resolve_authenticate(route, clause),
        });
    }

    for child in &router.routers {
        let child_chain = format!("{chain}{}", child.path.display_name());
        collect_router(
            project,
            child,
            &child_chain,
            &eff_header,
            &eff_body,
            clause,
            out,
        );
    }
}

fn write_messages(w: &mut CodeWriter) {
    w.open("const MESSAGES = {");
    w.line("_400: \"Bad request: {0}\",");
    w.line("_401: \"Unauthorized\",");
    w.line("_403: \"Forbidden\",");
    w.line("_404: \"Not found\",");
    w.line("_500: \"Internal server error\",");
    w.line("Started: \"Server started on port {0}\",");
    w.close("};");
    w.blank();
}

fn write_validators(w: &mut CodeWriter) {
    w.line("function isInt(value) { return /^[+-]?\\d+$/.test(String(value)); }");
    w.line("function isFloat(value) { return !isNaN(parseFloat(value)); }");
    w.line(
        "function isBoolean(value) { return value === true || value === false || \
         value === \"true\" || value === \"false\"; }",
    );
    w.line("function isString(value) { return typeof value === \"string\"; }");
    w.line("function isDate(value) { return /^\\d{4}-\\d{2}-\\d{2}$/.test(String(value)); }");
    w.line("function isDatetime(value) { return !isNaN(Date.parse(String(value))); }");
    w.line("function isTime(value) { return /^\\d{2}:\\d{2}(:\\d{2})?$/.test(String(value)); }");
    w.blank();
    w.open("function getHeader(headers, name) {");
    w.line(
        "const key = Object.keys(headers).find((k) => k.toLowerCase() === name.toLowerCase());",
    );
    w.line("return key === undefined ? undefined : headers[key];");
    w.close("}");
    w.blank();
    w.open("const VALIDATORS = {");
    w.line("any: () => true,");
    w.line("string: isString,");
    w.line("int: isInt,");
    w.line("float: isFloat,");
    w.line("boolean: isBoolean,");
    w.line("date: isDate,");
    w.line("datetime: isDatetime,");
    w.line("time: isTime,");
    w.close("};");
    w.blank();
}

/// The `#requireHeader`/`#requireQuery`/`#checkBody` helpers shared by all
/// handlers.
fn write_shared_helpers(w: &mut CodeWriter) {
    w.open("#requireHeader(req, res, name, check) {");
    w.line("const value = getHeader(req.headers, name);");
    w.open("if (value === undefined || !check(value)) {");
    w.line("res.status(400).send(MESSAGES._400.replace(\"{0}\", `header '${name}'`));");
    w.line("return false;");
    w.close("}");
    w.line("return true;");
    w.close("}");
    w.blank();

    w.open("#requireQuery(req, res, name, check) {");
    w.line("const value = req.query[name];");
    w.open("if (value === undefined || !check(value)) {");
    w.line("res.status(400).send(MESSAGES._400.replace(\"{0}\", `query parameter '${name}'`));");
    w.line("return false;");
    w.close("}");
    w.line("return true;");
    w.close("}");
    w.blank();

    w.open("#checkBody(res, value, schema, path) {");
    w.open("for (const [key, type] of Object.entries(schema)) {");
    w.line(
        "const entry = value === undefined || value === null ? undefined : value[key];",
    );
    w.line("const where = path === \"\" ? key : `${path}.${key}`;");
    w.open("if (typeof type === \"object\") {");
    w.open("if (entry === undefined || typeof entry !== \"object\") {");
    w.line("res.status(400).send(MESSAGES._400.replace(\"{0}\", `body field '${where}'`));");
    w.line("return false;");
    w.close("}");
    w.line("if (!this.#checkBody(res, entry, type, where)) return false;");
    w.close("} else if (entry === undefined || !VALIDATORS[type](entry)) {");
    w.indent();
    w.line("res.status(400).send(MESSAGES._400.replace(\"{0}\", `body field '${where}'`));");
    w.line("return false;");
    w.close("}");
    w.close("}");
    w.line("return true;");
    w.close("}");
    w.blank();
}

fn write_route_wiring(w: &mut CodeWriter, router_var: &str, chain: &str, route: &Route) {
    let handler = format!("on{chain}{}", route.path.display_name());
    w.line(format!(
        "{router_var}.{}({}, (req, res) => this.{handler}(req, res));",
        route.method.lowercase(),
        js_string(&route.path.with_colon_variables()),
    ));
}

/// Expression extracting a named value from the given source.
fn extract_credential(source: AuthSource, field: &str) -> String {
    match source {
        AuthSource::Header => format!("getHeader(req.headers, {})", js_string(field)),
        AuthSource::Body => format!(
            "req.body === undefined ? undefined : req.body[{}]",
            js_string(field)
        ),
        AuthSource::Query => format!("req.query[{}]", js_string(field)),
    }
}

fn secret_const(block: &AuthBlock) -> String {
    format!("{}_SECRET", block.display_name().to_uppercase())
}

/// The configured signing secret: a literal, an environment lookup, or a
/// development fallback.
fn secret_value(block: &AuthBlock) -> String {
    match block.options.get("secret") {
        Some(value) => js_value(value),
        None => js_string("ymir-secret"),
    }
}

fn expires_in(block: &AuthBlock) -> String {
    match block.options.get("expiresIn") {
        Some(OptionValue::Number(seconds)) => format!("{seconds}"),
        Some(value) => js_value(value),
        None => js_string("1h"),
    }
}

fn router_var(chain: &str) -> String {
    format!("{}Router", lower_first(chain))
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validator table key for a schema entry.
fn validator_key(value: &OptionValue) -> &str {
    match value.as_str() {
        Some(
            key @ ("any" | "string" | "int" | "float" | "boolean" | "date" | "datetime" | "time"),
        ) => key,
        _ => "any",
    }
}

fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn js_string_array(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| js_string(s)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Render an option value as a JavaScript expression. Globals lower to
/// `process.env.<NAME>`.
fn js_value(value: &OptionValue) -> String {
    match value {
        OptionValue::String(s) => js_string(s),
        OptionValue::Number(n) => format!("{n}"),
        OptionValue::Bool(b) => format!("{b}"),
        OptionValue::Global(global) => {
            let mut expr = format!("process.env.{}", global.path.join("."));
            if global.name != "env" {
                // Only `env` globals exist today; anything else keeps its
                // name for visibility.
                expr = format!("process.env.{}", global.name);
            }
            expr
        }
        OptionValue::Map(map) => js_schema(map),
        OptionValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(js_value).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

/// Render a schema map as a JavaScript object literal, insertion-ordered.
fn js_schema(map: &OptionMap) -> String {
    let mut parts = Vec::with_capacity(map.len());
    for (key, value) in map {
        let rendered = match value {
            OptionValue::Map(nested) => js_schema(nested),
            other => js_string(validator_key(other)),
        };
        parts.push(format!("{}: {rendered}", js_string(key)));
    }
    format!("{{ {} }}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ymir_parser::{ParsePolicy, parse_source};

    fn emit(source: &str) -> String {
        let project = parse_source(source, ParsePolicy::CancelOnFirstError).unwrap();
        let emitter = ExpressEmitter::new(EmitterConfig::default());
        let files = emitter.emit(&project).unwrap();
        assert_eq!(files.len(), 1);
        files[0].contents.clone()
    }

    #[test]
    fn test_empty_router() {
        let out = emit("target JavaScript_ExpressJS;\nrouter /api {}\n");

        assert!(out.contains("class YmirRestBase {"));
        assert!(out.contains("const apiRouter = express.Router();"));
        assert!(out.contains("app.use(\"/api\", apiRouter);"));
        // No routes, so no handlers are wired.
        assert!(!out.contains("apiRouter.get("));
    }

    #[test]
    fn test_query_validation_handler() {
        let out = emit(
            "target JavaScript_ExpressJS;\n\
             use json;\n\
             router /api { GET /hello?name=string as Hello; }\n",
        );

        assert!(out.contains("async onApiHello(req, res) {"));
        assert!(out.contains(
            "if (!this.#requireQuery(req, res, \"name\", VALIDATORS[\"string\"])) return false;"
        ));
        assert!(out.contains("app.use(express.json());"));
        assert!(out.contains("apiRouter.get(\"/hello\", (req, res) => this.onApiHello(req, res));"));
    }

    #[test]
    fn test_bearer_full_with_logout() {
        let out = emit(
            "target JavaScript_ExpressJS;\n\
             auth Bearer as apiKey (source: header, defaultAccess: authenticated, \
             mode: \"FULL\", withLogout: true);\n\
             router /api { GET /me as Me; }\n",
        );

        // The default clause applies to every route.
        assert!(out.contains("async onApiMe(req, res) {"));
        assert!(out.contains("await this.#handleApiKeyAuthentication(req, res)"));
        // Full mode: the emitter signs and verifies.
        assert!(out.contains("const jwt = require(\"jsonwebtoken\");"));
        assert!(out.contains("jwt.verify(token, APIKEY_SECRET)"));
        assert!(out.contains("this.getJwtPayloadFor"));
        assert!(out.contains("app.post(\"/login\""));
        assert!(out.contains("app.post(\"/logout\""));
        assert!(out.contains("await this.logoutApiKey(credential);"));
    }

    #[test]
    fn test_roles_emit_authorize_call() {
        let out = emit(
            "target JavaScript_ExpressJS;\n\
             auth API-Key as key (source: header, field: \"X-Api-Key\");\n\
             GET /admin as Admin authenticate key with [\"admin\"];\n",
        );

        assert!(out.contains("await this.authorizeKey(credential, [\"admin\"])"));
        assert!(out.contains("res.status(403).send(MESSAGES._403);"));
    }

    #[test]
    fn test_api_key_from_query() {
        let out = emit(
            "target JavaScript_ExpressJS;\n\
             auth API-Key as key (source: query, field: \"token\");\n\
             GET /x as X authenticate key;\n",
        );
        assert!(out.contains("req.query[\"token\"]"));
        assert!(out.contains("this.authenticateKey(String(raw))"));
    }

    #[test]
    fn test_bearer_requires_header_source() {
        let project = parse_source(
            "target JavaScript_ExpressJS;\n\
             auth Bearer as b (source: query, field: \"token\");\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let emitter = ExpressEmitter::new(EmitterConfig::default());
        assert!(matches!(
            emitter.emit(&project),
            Err(EmitError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_unknown_middleware() {
        let project = parse_source(
            "target JavaScript_ExpressJS;\nuse telepathy;\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let emitter = ExpressEmitter::new(EmitterConfig::default());
        assert!(matches!(
            emitter.emit(&project),
            Err(EmitError::UnknownMiddleware { .. })
        ));
    }

    #[test]
    fn test_cors_origin_from_env() {
        let out = emit(
            "target JavaScript_ExpressJS;\nuse cors(origin: @env.CORS_ORIGIN);\nuse env;\n",
        );
        assert!(out.contains("app.use(cors({ origin: process.env.CORS_ORIGIN }));"));
        assert!(out.contains("require(\"dotenv\").config();"));
    }

    #[test]
    fn test_header_and_body_inheritance() {
        let out = emit(
            "target JavaScript_ExpressJS;\n\
             router /api header(token: string) {\n\
                 POST /items as CreateItem body(name: string, meta: {tag: string});\n\
             }\n",
        );

        // The route handler validates the inherited header and its body.
        assert!(out.contains(
            "if (!this.#requireHeader(req, res, \"token\", VALIDATORS[\"string\"])) return false;"
        ));
        assert!(out.contains(
            "{ \"name\": \"string\", \"meta\": { \"tag\": \"string\" } }"
        ));
        // The router middleware enforces its own schema too.
        assert!(out.contains("apiRouter.use((req, res, next) => {"));
    }

    #[test]
    fn test_nested_router_mounting_order() {
        let out = emit(
            "target JavaScript_ExpressJS;\n\
             router /api { router /users { GET /:id as UserById; } }\n",
        );

        let users_decl = out.find("const apiUsersRouter = express.Router();").unwrap();
        let users_mount = out.find("apiRouter.use(\"/users\", apiUsersRouter);").unwrap();
        let api_mount = out.find("app.use(\"/api\", apiRouter);").unwrap();
        assert!(users_decl < users_mount);
        assert!(users_mount < api_mount);
        assert!(out.contains("apiUsersRouter.get(\"/:id\""));
    }

    #[test]
    fn test_route_description_becomes_comment() {
        let out = emit(
            "target JavaScript_ExpressJS;\n\
             // Greets the caller\n\
             GET /hello as Hello;\n",
        );
        assert!(out.contains("// Greets the caller"));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let source = "target JavaScript_ExpressJS;\n\
                      use json;\n\
                      auth Bearer as apiKey (source: header, mode: \"FULL\");\n\
                      router /api { GET /hello?name=string as Hello authenticate apiKey; }\n";
        assert_eq!(emit(source), emit(source));
    }
}
