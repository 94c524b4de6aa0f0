//! Vanilla-HTML frontend emitter.
//!
//! For every route carrying a `render` directive this emitter produces a
//! static page: `form` pages for POST/PATCH routes, `list`/`table`/
//! `detail` pages for GET routes. All pages share one stylesheet and one
//! small REST client that attaches the stored bearer token. When the
//! project defines a Bearer/Full auth block, login and logout pages are
//! generated as well.

use log::debug;

use ymir_core::auth::{AuthBlock, AuthType, BearerMode};
use ymir_core::option::{OptionMap, OptionValue, merge_options};
use ymir_core::path::join_paths;
use ymir_core::render::RenderKind;
use ymir_core::route::{Method, Route};
use ymir_core::router::{Project, Router};

use crate::writer::CodeWriter;
use crate::{EmitError, Emitter, EmitterConfig, GeneratedFile};

/// Stylesheet shared by all generated pages, emitted verbatim.
const STYLESHEET: &str = "\
body { font-family: sans-serif; margin: 2rem auto; max-width: 48rem; color: #222; }
h1 { font-size: 1.4rem; }
form { display: grid; gap: 0.6rem; }
fieldset { border: 1px solid #ccc; border-radius: 4px; display: grid; gap: 0.6rem; }
label { display: grid; gap: 0.2rem; font-size: 0.9rem; }
input { padding: 0.4rem; border: 1px solid #bbb; border-radius: 4px; }
button { padding: 0.5rem 1rem; border: none; border-radius: 4px; background: #2d6cdf; color: #fff; cursor: pointer; }
button:hover { background: #2056b5; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; }
.error { color: #b00020; }
";

pub struct FrontendEmitter {
    config: EmitterConfig,
}

/// A render-annotated route together with its qualified path.
struct Page<'a> {
    route: &'a Route,
    kind: RenderKind,
    /// Route path prefixed with its router chain.
    full_path: String,
    eff_body: OptionMap,
}

impl FrontendEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    fn bearer_mode(&self, block: &AuthBlock) -> BearerMode {
        block.bearer_mode().unwrap_or(self.config.bearer.as_mode())
    }
}

impl Emitter for FrontendEmitter {
    fn target(&self) -> &'static str {
        "Frontend_Vanilla"
    }

    fn emit(&self, project: &Project) -> Result<Vec<GeneratedFile>, EmitError> {
        debug!(emitter = self.target(); "Emitting frontend");

        let mut pages = Vec::new();
        let empty = OptionMap::new();
        collect_pages(&project.root, "", &empty, &mut pages)?;

        let mut files = vec![
            GeneratedFile::new("styles.css", STYLESHEET),
            GeneratedFile::new("client.js", client_script()),
        ];

        for page in &pages {
            let name = page_file_name(page.route);
            let html = match page.kind {
                RenderKind::Form => form_page(page),
                RenderKind::List => list_page(page),
                RenderKind::Table => table_page(page, project)?,
                RenderKind::Detail => detail_page(page),
            };
            files.push(GeneratedFile::new(name, html));
        }

        if let Some(block) = project
            .auth_blocks
            .values()
            .find(|b| b.auth_type == AuthType::Bearer && self.bearer_mode(b) == BearerMode::Full)
        {
            files.push(GeneratedFile::new("login.html", login_page(block)));
            if block.with_logout() {
                files.push(GeneratedFile::new("logout.html", logout_page(block)));
            }
        }

        Ok(files)
    }
}

fn collect_pages<'a>(
    router: &'a Router,
    prefix: &str,
    inh_body: &OptionMap,
    out: &mut Vec<Page<'a>>,
) -> Result<(), EmitError> {
    let eff_body = router.effective_body(inh_body);

    for route in &router.routes {
        let Some(render) = &route.render else {
            continue;
        };

        let form_ok = matches!(route.method, Method::Post | Method::Patch);
        let get_ok = route.method == Method::Get;
        let supported = match render.kind {
            RenderKind::Form => form_ok,
            RenderKind::List | RenderKind::Table | RenderKind::Detail => get_ok,
        };
        if !supported {
            return Err(EmitError::UnsupportedRender {
                kind: render.kind.to_string(),
                method: route.method.to_string(),
                at: render.pos.to_string(),
            });
        }

        let route_body = match &route.body {
            Some(own) => merge_options(&eff_body, own),
            None => eff_body.clone(),
        };
        out.push(Page {
            route,
            kind: render.kind,
            full_path: join_paths(prefix, &route.path.raw),
            eff_body: route_body,
        });
    }

    for child in &router.routers {
        let child_prefix = join_paths(prefix, &child.path.raw);
        collect_pages(child, &child_prefix, &eff_body, out)?;
    }
    Ok(())
}

fn page_file_name(route: &Route) -> String {
    format!("{}.html", route.path.name().to_lowercase())
}

fn page_title(route: &Route) -> String {
    route
        .description
        .clone()
        .unwrap_or_else(|| route.path.display_name())
}

fn page_shell(title: &str, body: impl FnOnce(&mut CodeWriter)) -> String {
    let mut w = CodeWriter::new();
    w.line("<!-- Generated by the Ymir compiler. Do not edit. -->");
    w.line("<!DOCTYPE html>");
    w.open("<html lang=\"en\">");
    w.open("<head>");
    w.line("<meta charset=\"utf-8\">");
    w.line(format!("<title>{}</title>", html_escape(title)));
    w.line("<link rel=\"stylesheet\" href=\"styles.css\">");
    w.line("<script src=\"client.js\"></script>");
    w.close("</head>");
    w.open("<body>");
    w.line(format!("<h1>{}</h1>", html_escape(title)));
    body(&mut w);
    w.close("</body>");
    w.close("</html>");
    w.finish()
}

/// Form inputs for a body schema; nested objects become fieldsets and
/// their fields carry dotted names (`meta.tag`).
fn write_form_fields(w: &mut CodeWriter, schema: &OptionMap, prefix: &str) {
    for (key, value) in schema {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            OptionValue::Map(nested) => {
                w.open("<fieldset>");
                w.line(format!("<legend>{}</legend>", html_escape(key)));
                write_form_fields(w, nested, &name);
                w.close("</fieldset>");
            }
            other => {
                let input_type = match other.as_str() {
                    Some("int") | Some("float") => "number",
                    Some("boolean") => "checkbox",
                    Some("date") => "date",
                    Some("datetime") => "datetime-local",
                    Some("time") => "time",
                    _ => "text",
                };
                w.open("<label>");
                w.line(html_escape(key));
                w.line(format!(
                    "<input name=\"{}\" type=\"{input_type}\">",
                    html_escape(&name)
                ));
                w.close("</label>");
            }
        }
    }
}

fn form_page(page: &Page<'_>) -> String {
    page_shell(&page_title(page.route), |w| {
        w.open("<form id=\"main-form\">");
        write_form_fields(w, &page.eff_body, "");
        w.line("<button type=\"submit\">Submit</button>");
        w.close("</form>");
        w.line("<p class=\"error\" id=\"error\"></p>");
        w.open("<script>");
        w.open("document.getElementById(\"main-form\").addEventListener(\"submit\", async (event) => {");
        w.line("event.preventDefault();");
        w.line("const data = ymirFormData(event.target);");
        w.open("try {");
        w.line(format!(
            "await ymirFetch(\"{}\", \"{}\", data);",
            page.route.method.as_str(),
            page.full_path
        ));
        w.line("event.target.reset();");
        w.close("} catch (err) {");
        w.indent();
        w.line("document.getElementById(\"error\").textContent = String(err);");
        w.close("}");
        w.close("});");
        w.close("</script>");
    })
}

fn list_page(page: &Page<'_>) -> String {
    page_shell(&page_title(page.route), |w| {
        w.line("<ul id=\"items\"></ul>");
        w.open("<script>");
        w.open("(async () => {");
        w.line(format!(
            "const items = await ymirFetch(\"GET\", \"{}\");",
            page.full_path
        ));
        w.line("const list = document.getElementById(\"items\");");
        w.open("for (const item of items ?? []) {");
        w.line("const entry = document.createElement(\"li\");");
        w.line("entry.textContent = JSON.stringify(item);");
        w.line("list.appendChild(entry);");
        w.close("}");
        w.close("})();");
        w.close("</script>");
    })
}

fn table_page(page: &Page<'_>, project: &Project) -> Result<String, EmitError> {
    // Integrated sibling routes become per-row action buttons.
    let mut actions: Vec<(String, String, String)> = Vec::new();
    if let Some(render) = &page.route.render {
        for alias in render.integrated_aliases() {
            let (sibling, parent) = project
                .find_route_by_alias(&alias)
                .ok_or_else(|| EmitError::Unsupported {
                    what: format!("integrated route `{alias}` does not exist"),
                    at: render.pos.to_string(),
                })?;
            actions.push((
                alias.clone(),
                sibling.method.as_str().to_string(),
                join_paths(&parent, &sibling.path.raw),
            ));
        }
    }

    let columns: Vec<String> = page
        .route
        .response
        .as_ref()
        .map(|schema| schema.keys().cloned().collect())
        .unwrap_or_default();

    Ok(page_shell(&page_title(page.route), |w| {
        w.open("<table id=\"data\">");
        w.open("<thead><tr>");
        for column in &columns {
            w.line(format!("<th>{}</th>", html_escape(column)));
        }
        if !actions.is_empty() {
            w.line("<th>Actions</th>");
        }
        w.close("</tr></thead>");
        w.line("<tbody id=\"rows\"></tbody>");
        w.close("</table>");

        w.open("<script>");
        w.line(format!("const COLUMNS = {};", js_string_list(&columns)));
        w.open("const ACTIONS = [");
        for (alias, method, path) in &actions {
            w.line(format!(
                "{{ label: \"{alias}\", method: \"{method}\", path: \"{path}\" }},"
            ));
        }
        w.close("];");
        w.open("(async () => {");
        w.line(format!(
            "const rows = await ymirFetch(\"GET\", \"{}\");",
            page.full_path
        ));
        w.line("const body = document.getElementById(\"rows\");");
        w.open("for (const row of rows ?? []) {");
        w.line("const tr = document.createElement(\"tr\");");
        w.open("for (const column of COLUMNS) {");
        w.line("const td = document.createElement(\"td\");");
        w.line("td.textContent = String(row[column] ?? \"\");");
        w.line("tr.appendChild(td);");
        w.close("}");
        w.open("if (ACTIONS.length > 0) {");
        w.line("const td = document.createElement(\"td\");");
        w.open("for (const action of ACTIONS) {");
        w.line("const button = document.createElement(\"button\");");
        w.line("button.textContent = action.label;");
        w.line(
            "button.addEventListener(\"click\", () => \
             ymirFetch(action.method, ymirFillPath(action.path, row)));",
        );
        w.line("td.appendChild(button);");
        w.close("}");
        w.line("tr.appendChild(td);");
        w.close("}");
        w.line("body.appendChild(tr);");
        w.close("}");
        w.close("})();");
        w.close("</script>");
    }))
}

fn detail_page(page: &Page<'_>) -> String {
    page_shell(&page_title(page.route), |w| {
        w.line("<dl id=\"detail\"></dl>");
        w.open("<script>");
        w.open("(async () => {");
        w.line(format!(
            "const item = await ymirFetch(\"GET\", \"{}\");",
            page.full_path
        ));
        w.line("const detail = document.getElementById(\"detail\");");
        w.open("for (const [key, value] of Object.entries(item ?? {})) {");
        w.line("const dt = document.createElement(\"dt\");");
        w.line("dt.textContent = key;");
        w.line("const dd = document.createElement(\"dd\");");
        w.line("dd.textContent = String(value);");
        w.line("detail.append(dt, dd);");
        w.close("}");
        w.close("})();");
        w.close("</script>");
    })
}

fn login_page(block: &AuthBlock) -> String {
    let mut shell = CodeWriter::new();
    let username = block.username_field();
    let password = block.password_field();
    let login_path = block.login_path();

    shell.line("<!-- Generated by the Ymir compiler. Do not edit. -->");
    shell.line("<!DOCTYPE html>");
    shell.open("<html lang=\"en\">");
    shell.open("<head>");
    shell.line("<meta charset=\"utf-8\">");
    shell.line("<title>Login</title>");
    shell.line("<link rel=\"stylesheet\" href=\"styles.css\">");
    shell.line("<script src=\"client.js\"></script>");
    shell.close("</head>");
    shell.open("<body>");
    shell.line("<h1>Login</h1>");
    shell.open("<form id=\"login-form\">");
    shell.line(format!(
        "<label>{username}<input name=\"{username}\" type=\"text\"></label>"
    ));
    shell.line(format!(
        "<label>{password}<input name=\"{password}\" type=\"password\"></label>"
    ));
    shell.line("<button type=\"submit\">Login</button>");
    shell.close("</form>");
    shell.line("<p class=\"error\" id=\"error\"></p>");
    shell.open("<script>");
    shell.open("document.getElementById(\"login-form\").addEventListener(\"submit\", async (event) => {");
    shell.line("event.preventDefault();");
    shell.line("const data = ymirFormData(event.target);");
    shell.open("try {");
    shell.line(format!(
        "const result = await ymirFetch(\"POST\", \"{login_path}\", data);"
    ));
    shell.line("localStorage.setItem(YMIR_TOKEN_KEY, result.token);");
    shell.line("window.location.href = \"index.html\";");
    shell.close("} catch (err) {");
    shell.indent();
    shell.line("document.getElementById(\"error\").textContent = String(err);");
    shell.close("}");
    shell.close("});");
    shell.close("</script>");
    shell.close("</body>");
    shell.close("</html>");
    shell.finish()
}

fn logout_page(block: &AuthBlock) -> String {
    let logout_path = block.logout_path();
    let mut w = CodeWriter::new();
    w.line("<!-- Generated by the Ymir compiler. Do not edit. -->");
    w.line("<!DOCTYPE html>");
    w.open("<html lang=\"en\">");
    w.open("<head>");
    w.line("<meta charset=\"utf-8\">");
    w.line("<title>Logout</title>");
    w.line("<link rel=\"stylesheet\" href=\"styles.css\">");
    w.line("<script src=\"client.js\"></script>");
    w.close("</head>");
    w.open("<body>");
    w.line("<h1>Logging out…</h1>");
    w.open("<script>");
    w.open("(async () => {");
    w.open("try {");
    w.line(format!("await ymirFetch(\"POST\", \"{logout_path}\");"));
    w.close("} finally {");
    w.indent();
    w.line("localStorage.removeItem(YMIR_TOKEN_KEY);");
    w.line("window.location.href = \"login.html\";");
    w.close("}");
    w.close("})();");
    w.close("</script>");
    w.close("</body>");
    w.close("</html>");
    w.finish()
}

/// The shared REST client.
fn client_script() -> String {
    let mut w = CodeWriter::new();
    w.line("// Generated by the Ymir compiler. Do not edit.");
    w.line("const YMIR_TOKEN_KEY = \"ymir.token\";");
    w.blank();
    w.open("async function ymirFetch(method, path, body) {");
    w.line("const headers = { \"Content-Type\": \"application/json\" };");
    w.line("const token = localStorage.getItem(YMIR_TOKEN_KEY);");
    w.open("if (token) {");
    w.line("headers[\"Authorization\"] = `Bearer ${token}`;");
    w.close("}");
    w.open("const response = await fetch(path, {");
    w.line("method,");
    w.line("headers,");
    w.line("body: body === undefined ? undefined : JSON.stringify(body),");
    w.close("});");
    w.open("if (!response.ok) {");
    w.line("throw new Error(`Request failed with status ${response.status}`);");
    w.close("}");
    w.line("const text = await response.text();");
    w.line("return text === \"\" ? null : JSON.parse(text);");
    w.close("}");
    w.blank();
    w.open("function ymirFormData(form) {");
    w.line("const data = {};");
    w.open("for (const [name, value] of new FormData(form)) {");
    w.line("const parts = name.split(\".\");");
    w.line("let target = data;");
    w.open("while (parts.length > 1) {");
    w.line("const part = parts.shift();");
    w.line("target[part] = target[part] ?? {};");
    w.line("target = target[part];");
    w.close("}");
    w.line("target[parts[0]] = value;");
    w.close("}");
    w.line("return data;");
    w.close("}");
    w.blank();
    w.open("function ymirFillPath(path, row) {");
    w.line(
        "return path.replace(/:([A-Za-z_][A-Za-z0-9_]*)/g, (_match, name) => \
         encodeURIComponent(row[name] ?? \"\"));",
    );
    w.close("}");
    w.finish()
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn js_string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("\"{s}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ymir_parser::{ParsePolicy, parse_source};

    fn emit(source: &str) -> Vec<GeneratedFile> {
        let project = parse_source(source, ParsePolicy::CancelOnFirstError).unwrap();
        FrontendEmitter::new(EmitterConfig::default())
            .emit(&project)
            .unwrap()
    }

    fn file<'a>(files: &'a [GeneratedFile], name: &str) -> &'a GeneratedFile {
        files
            .iter()
            .find(|f| f.path.to_string_lossy() == name)
            .unwrap_or_else(|| panic!("missing file `{name}`"))
    }

    #[test]
    fn test_shared_assets_always_emitted() {
        let files = emit("target T;\n");
        assert!(file(&files, "styles.css").contents.contains("font-family"));
        assert!(file(&files, "client.js")
            .contents
            .contains("async function ymirFetch"));
    }

    #[test]
    fn test_form_page_flattens_nested_schema() {
        let files = emit(
            "target T;\n\
             router /api {\n\
                 POST /users as CreateUser body(name: string, address: {city: string, zip: int}) \
                 render form;\n\
             }\n",
        );

        let page = file(&files, "createuser.html");
        assert!(page.contents.contains("<input name=\"name\" type=\"text\">"));
        assert!(page.contents.contains("<legend>address</legend>"));
        assert!(page
            .contents
            .contains("<input name=\"address.city\" type=\"text\">"));
        assert!(page
            .contents
            .contains("<input name=\"address.zip\" type=\"number\">"));
        assert!(page.contents.contains("ymirFetch(\"POST\", \"/api/users\""));
    }

    #[test]
    fn test_table_page_with_integrations() {
        let files = emit(
            "target T;\n\
             router /api {\n\
                 GET /users as Users responses(id: int, name: string) render table \
                 (integrate: [\"DeleteUser\"]);\n\
                 DELETE /users/:id as DeleteUser;\n\
             }\n",
        );

        let page = file(&files, "users.html");
        assert!(page.contents.contains("<th>id</th>"));
        assert!(page.contents.contains("<th>name</th>"));
        assert!(page.contents.contains(
            "{ label: \"DeleteUser\", method: \"DELETE\", path: \"/api/users/:id\" },"
        ));
    }

    #[test]
    fn test_detail_and_list_pages() {
        let files = emit(
            "target T;\n\
             GET /me as Me render detail;\n\
             GET /posts as Posts render list;\n",
        );

        assert!(file(&files, "me.html").contents.contains("ymirFetch(\"GET\", \"/me\")"));
        assert!(file(&files, "posts.html")
            .contents
            .contains("ymirFetch(\"GET\", \"/posts\")"));
    }

    #[test]
    fn test_form_on_get_is_rejected() {
        let project = parse_source(
            "target T;\nGET /x as X render form;\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let result = FrontendEmitter::new(EmitterConfig::default()).emit(&project);
        assert!(matches!(result, Err(EmitError::UnsupportedRender { .. })));
    }

    #[test]
    fn test_table_on_post_is_rejected() {
        let project = parse_source(
            "target T;\nPOST /x as X render table;\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let result = FrontendEmitter::new(EmitterConfig::default()).emit(&project);
        assert!(matches!(result, Err(EmitError::UnsupportedRender { .. })));
    }

    #[test]
    fn test_unknown_integration_is_rejected() {
        let project = parse_source(
            "target T;\nGET /x as X render table (integrate: [\"Nope\"]);\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let result = FrontendEmitter::new(EmitterConfig::default()).emit(&project);
        assert!(matches!(result, Err(EmitError::Unsupported { .. })));
    }

    #[test]
    fn test_bearer_full_login_pages() {
        let files = emit(
            "target T;\n\
             auth Bearer as apiKey (source: header, mode: \"FULL\", withLogout: true);\n",
        );

        let login = file(&files, "login.html");
        assert!(login.contents.contains("ymirFetch(\"POST\", \"/login\""));
        assert!(login
            .contents
            .contains("localStorage.setItem(YMIR_TOKEN_KEY, result.token);"));

        let logout = file(&files, "logout.html");
        assert!(logout.contents.contains("ymirFetch(\"POST\", \"/logout\")"));
        assert!(logout
            .contents
            .contains("localStorage.removeItem(YMIR_TOKEN_KEY);"));
    }

    #[test]
    fn test_no_login_page_without_full_bearer() {
        let files = emit(
            "target T;\nauth Bearer as apiKey (source: header, mode: \"NONE\");\n",
        );
        assert!(!files.iter().any(|f| f.path.to_string_lossy() == "login.html"));
    }
}
