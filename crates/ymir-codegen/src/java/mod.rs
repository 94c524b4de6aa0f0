//! Java/Spring-Boot emitter.
//!
//! For each router carrying routes this emitter produces an
//! `XxxController` (annotated `@RestController`/`@RequestMapping`) that
//! validates authentication and delegates to an `XxxControllerHandler`
//! interface, which the application implements. Body schemas become DTO
//! classes in the DTO package, deduplicated by the canonical option hash;
//! auth blocks become `<Name>Authenticator` interfaces plus, for
//! Bearer/Full, a signing utility and a login controller.
//!
//! All classes are assembled through the [`builder`] IR and rendered in a
//! single terminal step.

pub mod builder;

use indexmap::IndexMap;
use log::debug;

use ymir_core::auth::{AuthBlock, AuthSource, AuthType, AuthenticateClause, BearerMode};
use ymir_core::hash::option_hash;
use ymir_core::ident;
use ymir_core::option::{OptionMap, OptionValue, merge_options};
use ymir_core::path::{ParamType, join_paths};
use ymir_core::route::Route;
use ymir_core::router::{Project, Router};

use crate::{EmitError, Emitter, EmitterConfig, GeneratedFile, JavaConfig};
use builder::{ClassBuilder, FieldBuilder, MethodBuilder, Parameter};

/// Source-tree prefix for every generated Java file.
const SOURCE_ROOT: &str = "src/main/java";

pub struct JavaEmitter {
    config: EmitterConfig,
}

impl JavaEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    fn java(&self) -> &JavaConfig {
        &self.config.java
    }

    fn bearer_mode(&self, block: &AuthBlock) -> BearerMode {
        block.bearer_mode().unwrap_or(self.config.bearer.as_mode())
    }
}

impl Emitter for JavaEmitter {
    fn target(&self) -> &'static str {
        "Java_SpringBoot"
    }

    fn emit(&self, project: &Project) -> Result<Vec<GeneratedFile>, EmitError> {
        debug!(emitter = self.target(); "Emitting project");

        for block in project.auth_blocks.values() {
            let header_only = block.auth_type == AuthType::Bearer;
            if header_only && block.source != AuthSource::Header {
                return Err(EmitError::Unsupported {
                    what: format!(
                        "Bearer auth block `{}` must source its token from `header`",
                        block.identity()
                    ),
                    at: block.pos.to_string(),
                });
            }
            if block.source == AuthSource::Body {
                return Err(EmitError::Unsupported {
                    what: format!(
                        "auth block `{}`: the Java target cannot extract credentials \
                         from the request body",
                        block.identity()
                    ),
                    at: block.pos.to_string(),
                });
            }
        }

        let mut classes: Vec<ClassBuilder> = Vec::new();
        let mut dtos = DtoRegistry::new(self.java().dto.clone());

        let empty = OptionMap::new();
        self.emit_router(
            project,
            &project.root,
            "",
            "",
            &empty,
            &empty,
            None,
            &mut classes,
            &mut dtos,
        )?;

        for block in project.auth_blocks.values() {
            classes.push(self.authenticator_interface(block));
            if block.auth_type == AuthType::Bearer {
                match self.bearer_mode(block) {
                    BearerMode::None => {}
                    BearerMode::Basic => classes.push(self.auth_controller(block, BearerMode::Basic)),
                    BearerMode::Full => {
                        classes.push(self.auth_util(block));
                        classes.push(self.auth_controller(block, BearerMode::Full));
                    }
                }
            }
        }

        self.emit_middlewares(project, &mut classes)?;
        classes.extend(dtos.finish());

        Ok(classes
            .into_iter()
            .map(|class| {
                GeneratedFile::new(format!("{SOURCE_ROOT}/{}", class.file_path()), class.render())
            })
            .collect())
    }
}

impl JavaEmitter {
    /// Emit the controller/handler pair for one router, then recurse.
    #[allow(clippy::too_many_arguments)]
    fn emit_router(
        &self,
        project: &Project,
        router: &Router,
        chain: &str,
        prefix: &str,
        inh_header: &OptionMap,
        inh_body: &OptionMap,
        inh_clause: Option<&AuthenticateClause>,
        classes: &mut Vec<ClassBuilder>,
        dtos: &mut DtoRegistry,
    ) -> Result<(), EmitError> {
        let eff_header = router.effective_header(inh_header);
        let eff_body = router.effective_body(inh_body);
        let clause = router.effective_authenticate(inh_clause);

        if !router.routes.is_empty() {
            let (controller, handler) = self.controller_pair(
                project,
                router,
                chain,
                braced_prefix(prefix),
                &eff_header,
                &eff_body,
                clause,
                dtos,
            )?;
            classes.push(controller);
            classes.push(handler);
        }

        for child in &router.routers {
            let child_chain = format!("{chain}{}", child.path.display_name());
            let child_prefix = join_paths(prefix, &child.path.raw);
            self.emit_router(
                project,
                child,
                &child_chain,
                &child_prefix,
                &eff_header,
                &eff_body,
                clause,
                classes,
                dtos,
            )?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn controller_pair(
        &self,
        project: &Project,
        router: &Router,
        chain: &str,
        base_path: String,
        eff_header: &OptionMap,
        eff_body: &OptionMap,
        clause: Option<&AuthenticateClause>,
        dtos: &mut DtoRegistry,
    ) -> Result<(ClassBuilder, ClassBuilder), EmitError> {
        let base_name = if chain.is_empty() { "Root" } else { chain };
        let controller_name = format!("{base_name}Controller");
        let handler_name = format!("{base_name}ControllerHandler");

        let mut controller =
            ClassBuilder::class(self.java().controller.clone(), controller_name);
        controller.add_import("org.springframework.web.bind.annotation.*");
        controller.add_import("org.springframework.beans.factory.annotation.Autowired");
        controller.add_annotation("@RestController");
        controller.add_annotation(format!("@RequestMapping(\"{base_path}\")"));
        controller.add_field(
            FieldBuilder::new(handler_name.clone(), "handler").with_annotation("@Autowired"),
        );

        let mut handler = ClassBuilder::interface(self.java().controller.clone(), handler_name);

        for route in &router.routes {
            let resolved = project.resolve_authenticate(route, clause);
            let block = match &resolved {
                Some(clause) => Some(
                    project
                        .auth_block(&clause.block)
                        .ok_or_else(|| EmitError::UnknownAuthBlock(clause.block.clone()))?,
                ),
                None => None,
            };

            if let Some(block) = block {
                let field = format!("{}Authenticator", lower_first(&block.display_name()));
                controller.add_import(format!(
                    "{}.{}Authenticator",
                    self.java().auth,
                    block.display_name()
                ));
                controller.add_field(
                    FieldBuilder::new(format!("{}Authenticator", block.display_name()), field)
                        .with_annotation("@Autowired"),
                );
            }

            let (method, iface_method) = self.route_methods(
                route,
                chain,
                eff_header,
                eff_body,
                resolved.as_ref(),
                block,
                &mut controller,
                dtos,
            )?;
            controller.add_method(method);
            handler.add_method(iface_method);
        }

        Ok((controller, handler))
    }

    /// Build the controller method and the matching handler stub for one
    /// route.
    #[allow(clippy::too_many_arguments)]
    fn route_methods(
        &self,
        route: &Route,
        chain: &str,
        eff_header: &OptionMap,
        eff_body: &OptionMap,
        clause: Option<&AuthenticateClause>,
        block: Option<&AuthBlock>,
        controller: &mut ClassBuilder,
        dtos: &mut DtoRegistry,
    ) -> Result<(MethodBuilder, MethodBuilder), EmitError> {
        let name = lower_first(&format!(
            "{}{chain}{}",
            route.method.capitalized(),
            route.path.display_name()
        ));

        let mut method = MethodBuilder::new("Object", name.clone()).with_annotation(format!(
            "@RequestMapping(path = \"{}\", method = RequestMethod.{})",
            route.path.with_braced_variables(),
            route.method.as_str(),
        ));
        if let Some(description) = &route.description {
            method = method.with_comment(description.clone());
        }
        let mut iface_method = MethodBuilder::new("Object", name);
        if let Some(description) = &route.description {
            iface_method = iface_method.with_comment(description.clone());
        }

        let mut forwarded: Vec<String> = Vec::new();

        for variable in route.path.variables() {
            let param = java_ident(variable);
            method = method.with_parameter(Parameter::new(
                format!("@PathVariable(\"{variable}\") String"),
                param.clone(),
            ));
            iface_method = iface_method.with_parameter(Parameter::new("String", param.clone()));
            forwarded.push(param);
        }

        for query in &route.path.query {
            let param = java_ident(&query.name);
            let ty = java_type(query.ty, controller);
            method = method.with_parameter(Parameter::new(
                format!("@RequestParam(\"{}\") {ty}", query.name),
                param.clone(),
            ));
            iface_method = iface_method.with_parameter(Parameter::new(ty, param.clone()));
            forwarded.push(param);
        }

        let route_header = match &route.header {
            Some(own) => merge_options(eff_header, own),
            None => eff_header.clone(),
        };
        for (header_name, _value) in &route_header {
            let param = java_ident(header_name);
            method = method.with_parameter(Parameter::new(
                format!("@RequestHeader(\"{header_name}\") String"),
                param.clone(),
            ));
            iface_method = iface_method.with_parameter(Parameter::new("String", param.clone()));
            forwarded.push(param);
        }

        let route_body = match &route.body {
            Some(own) => merge_options(eff_body, own),
            None => eff_body.clone(),
        };
        if !route_body.is_empty() {
            let dto = dtos.dto_for(chain, route, &route_body)?;
            controller.add_import(format!("{}.{dto}", self.java().dto));
            method = method.with_parameter(Parameter::new(format!("@RequestBody {dto}"), "body"));
            iface_method = iface_method.with_parameter(Parameter::new(dto, "body"));
            forwarded.push("body".to_string());
        }

        if self.java().append_request {
            controller.add_import("jakarta.servlet.http.HttpServletRequest");
            method = method.with_parameter(Parameter::new("HttpServletRequest", "request"));
            iface_method = iface_method.with_parameter(Parameter::new(
                "jakarta.servlet.http.HttpServletRequest",
                "request",
            ));
            forwarded.push("request".to_string());
        }

        if let (Some(clause), Some(block)) = (clause, block) {
            let (credential_param, auth_lines) = self.auth_check(clause, block, controller);
            method = method.with_parameter(credential_param);
            for line in auth_lines {
                method = method.with_body_line(line);
            }
        }

        method = method.with_body_line(format!(
            "return handler.{}({});",
            iface_method.name,
            forwarded.join(", ")
        ));

        Ok((method, iface_method))
    }

    /// The credential parameter and the authentication/authorization
    /// statements at the top of a guarded controller method.
    fn auth_check(
        &self,
        clause: &AuthenticateClause,
        block: &AuthBlock,
        controller: &mut ClassBuilder,
    ) -> (Parameter, Vec<String>) {
        controller.add_import("org.springframework.http.HttpStatus");
        controller.add_import("org.springframework.web.server.ResponseStatusException");

        let field = format!("{}Authenticator", lower_first(&block.display_name()));
        // Body sources were rejected up front in `emit`.
        let credential_param = match block.source {
            AuthSource::Header | AuthSource::Body => format!(
                "@RequestHeader(value = \"{}\", required = false) String",
                block.field
            ),
            AuthSource::Query => format!(
                "@RequestParam(value = \"{}\", required = false) String",
                block.field
            ),
        };
        let credential_param = Parameter::new(credential_param, "authCredential");

        let mut lines: Vec<String> = Vec::new();
        let authorize_credential;
        match block.auth_type {
            AuthType::ApiKey => {
                lines.push(format!(
                    "if (authCredential == null || !{field}.authenticate(authCredential)) {{"
                ));
                lines.push("    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);".into());
                lines.push("}".into());
                authorize_credential = "authCredential".to_string();
            }
            AuthType::Bearer => {
                lines.push(
                    "String bearerToken = authCredential == null ? null : \
                     authCredential.replaceFirst(\"^Bearer \", \"\");"
                        .into(),
                );
                match self.bearer_mode(block) {
                    BearerMode::None => {
                        lines.push(format!(
                            "if (bearerToken == null || !{field}.authenticate(bearerToken)) {{"
                        ));
                        lines.push(
                            "    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);"
                                .into(),
                        );
                        lines.push("}".into());
                        authorize_credential = "bearerToken".to_string();
                    }
                    BearerMode::Basic => {
                        lines.push(format!(
                            "if (bearerToken == null || !{field}.validateJwt(bearerToken)) {{"
                        ));
                        lines.push(
                            "    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);"
                                .into(),
                        );
                        lines.push("}".into());
                        authorize_credential = "bearerToken".to_string();
                    }
                    BearerMode::Full => {
                        controller.add_import("com.auth0.jwt.interfaces.DecodedJWT");
                        controller.add_import(format!(
                            "{}.{}AuthUtil",
                            self.java().auth,
                            block.display_name()
                        ));
                        lines.push(format!(
                            "DecodedJWT bearerPayload = {}AuthUtil.verifyOrNull(bearerToken);",
                            block.display_name()
                        ));
                        lines.push(format!(
                            "if (bearerPayload == null || !{field}.validateJwtPayload(bearerPayload)) {{"
                        ));
                        lines.push(
                            "    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);"
                                .into(),
                        );
                        lines.push("}".into());
                        authorize_credential = "bearerPayload".to_string();
                    }
                }
            }
        }

        if !clause.roles.is_empty() {
            controller.add_import("java.util.List");
            let roles: Vec<String> = clause.roles.iter().map(|r| java_string(r)).collect();
            lines.push(format!(
                "if (!{field}.authorize({authorize_credential}, List.of({}))) {{",
                roles.join(", ")
            ));
            lines.push("    throw new ResponseStatusException(HttpStatus.FORBIDDEN);".into());
            lines.push("}".into());
        }

        (credential_param, lines)
    }

    /// The `<Name>Authenticator` interface for one auth block.
    fn authenticator_interface(&self, block: &AuthBlock) -> ClassBuilder {
        let name = block.display_name();
        let mut iface =
            ClassBuilder::interface(self.java().auth.clone(), format!("{name}Authenticator"));

        let credential_type = match (block.auth_type, self.bearer_mode(block)) {
            (AuthType::Bearer, BearerMode::Full) => {
                iface.add_import("com.auth0.jwt.interfaces.DecodedJWT");
                "DecodedJWT"
            }
            _ => "String",
        };

        match block.auth_type {
            AuthType::ApiKey => {
                iface.add_method(
                    MethodBuilder::new("boolean", "authenticate")
                        .with_parameter(Parameter::new("String", "apiKey")),
                );
            }
            AuthType::Bearer => match self.bearer_mode(block) {
                BearerMode::None => {
                    iface.add_method(
                        MethodBuilder::new("boolean", "authenticate")
                            .with_parameter(Parameter::new("String", "jwt")),
                    );
                }
                BearerMode::Basic => {
                    iface.add_method(
                        MethodBuilder::new("boolean", "validateJwt")
                            .with_parameter(Parameter::new("String", "jwt")),
                    );
                    iface.add_method(
                        MethodBuilder::new("String", "generateJwt")
                            .with_parameter(Parameter::new("String", "username"))
                            .with_parameter(Parameter::new("String", "password")),
                    );
                    if block.with_logout() {
                        iface.add_method(
                            MethodBuilder::new("void", "logout")
                                .with_parameter(Parameter::new("String", "jwt")),
                        );
                    }
                }
                BearerMode::Full => {
                    iface.add_import("java.util.Map");
                    iface.add_method(
                        MethodBuilder::new("Map<String, Object>", "getJwtPayload")
                            .with_parameter(Parameter::new("String", "username"))
                            .with_parameter(Parameter::new("String", "password")),
                    );
                    iface.add_method(
                        MethodBuilder::new("boolean", "validateJwtPayload")
                            .with_parameter(Parameter::new("DecodedJWT", "payload")),
                    );
                    if block.with_logout() {
                        iface.add_method(
                            MethodBuilder::new("void", "logout")
                                .with_parameter(Parameter::new("DecodedJWT", "payload")),
                        );
                    }
                }
            },
        }

        if block.authorization_in_use {
            iface.add_import("java.util.List");
            iface.add_method(
                MethodBuilder::new("boolean", "authorize")
                    .with_parameter(Parameter::new(credential_type, "credential"))
                    .with_parameter(Parameter::new("List<String>", "roles")),
            );
        }

        iface
    }

    /// The `<Name>AuthUtil` signing/verification helper (Bearer/Full).
    fn auth_util(&self, block: &AuthBlock) -> ClassBuilder {
        let name = block.display_name();
        let mut class = ClassBuilder::class(self.java().auth.clone(), format!("{name}AuthUtil"));
        class.add_import("com.auth0.jwt.JWT");
        class.add_import("com.auth0.jwt.algorithms.Algorithm");
        class.add_import("com.auth0.jwt.exceptions.JWTVerificationException");
        class.add_import("com.auth0.jwt.interfaces.DecodedJWT");
        class.add_import("java.time.Instant");
        class.add_import("java.util.Map");

        class.add_field(
            FieldBuilder::new("Algorithm", "ALGORITHM")
                .with_initializer(format!("Algorithm.HMAC256({})", java_secret(block)))
                .static_final(),
        );
        class.add_field(
            FieldBuilder::new("long", "EXPIRES_SECONDS")
                .with_initializer(expires_seconds(block).to_string())
                .static_final(),
        );

        class.add_method(
            MethodBuilder::new("String", "sign")
                .make_static()
                .with_parameter(Parameter::new("Map<String, Object>", "payload"))
                .with_body_line("return JWT.create()")
                .with_body_line("        .withPayload(payload)")
                .with_body_line("        .withExpiresAt(Instant.now().plusSeconds(EXPIRES_SECONDS))")
                .with_body_line("        .sign(ALGORITHM);"),
        );
        class.add_method(
            MethodBuilder::new("DecodedJWT", "verifyOrNull")
                .make_static()
                .with_parameter(Parameter::new("String", "token"))
                .with_body_line("if (token == null) {")
                .with_body_line("    return null;")
                .with_body_line("}")
                .with_body_line("try {")
                .with_body_line("    return JWT.require(ALGORITHM).build().verify(token);")
                .with_body_line("} catch (JWTVerificationException e) {")
                .with_body_line("    return null;")
                .with_body_line("}"),
        );

        class
    }

    /// The `<Name>AuthController` exposing login (and optional logout).
    fn auth_controller(&self, block: &AuthBlock, mode: BearerMode) -> ClassBuilder {
        let name = block.display_name();
        let mut class =
            ClassBuilder::class(self.java().auth.clone(), format!("{name}AuthController"));
        class.add_import("org.springframework.web.bind.annotation.*");
        class.add_import("org.springframework.beans.factory.annotation.Autowired");
        class.add_import("org.springframework.http.HttpStatus");
        class.add_import("org.springframework.web.server.ResponseStatusException");
        class.add_import("java.util.Map");
        class.add_annotation("@RestController");
        class.add_field(
            FieldBuilder::new(format!("{name}Authenticator"), "authenticator")
                .with_annotation("@Autowired"),
        );

        let login_source = block
            .options
            .get("loginSource")
            .and_then(OptionValue::as_str)
            .and_then(AuthSource::parse)
            .unwrap_or(AuthSource::Body);

        let mut login = MethodBuilder::new("Object", "login").with_annotation(format!(
            "@RequestMapping(path = \"{}\", method = RequestMethod.POST)",
            block.login_path()
        ));
        let (username_expr, password_expr) = match login_source {
            AuthSource::Body => {
                login = login.with_parameter(Parameter::new(
                    "@RequestBody Map<String, String>",
                    "credentials",
                ));
                (
                    format!("credentials.get({})", java_string(&block.username_field())),
                    format!("credentials.get({})", java_string(&block.password_field())),
                )
            }
            AuthSource::Query => {
                login = login
                    .with_parameter(Parameter::new(
                        format!("@RequestParam(\"{}\") String", block.username_field()),
                        "username",
                    ))
                    .with_parameter(Parameter::new(
                        format!("@RequestParam(\"{}\") String", block.password_field()),
                        "password",
                    ));
                ("username".to_string(), "password".to_string())
            }
            AuthSource::Header => {
                login = login
                    .with_parameter(Parameter::new(
                        format!("@RequestHeader(\"{}\") String", block.username_field()),
                        "username",
                    ))
                    .with_parameter(Parameter::new(
                        format!("@RequestHeader(\"{}\") String", block.password_field()),
                        "password",
                    ));
                ("username".to_string(), "password".to_string())
            }
        };

        match mode {
            BearerMode::Basic => {
                login = login
                    .with_body_line(format!(
                        "String token = authenticator.generateJwt({username_expr}, {password_expr});"
                    ))
                    .with_body_line("if (token == null) {")
                    .with_body_line(
                        "    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);",
                    )
                    .with_body_line("}")
                    .with_body_line("return Map.of(\"token\", token);");
            }
            BearerMode::Full => {
                login = login
                    .with_body_line(format!(
                        "Map<String, Object> payload = \
                         authenticator.getJwtPayload({username_expr}, {password_expr});"
                    ))
                    .with_body_line("if (payload == null) {")
                    .with_body_line(
                        "    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);",
                    )
                    .with_body_line("}")
                    .with_body_line(format!(
                        "return Map.of(\"token\", {name}AuthUtil.sign(payload));"
                    ));
            }
            BearerMode::None => unreachable!("auth controllers exist only for Basic and Full"),
        }
        class.add_method(login);

        if block.with_logout() {
            let mut logout = MethodBuilder::new("void", "logout")
                .with_annotation(format!(
                    "@RequestMapping(path = \"{}\", method = RequestMethod.POST)",
                    block.logout_path()
                ))
                .with_parameter(Parameter::new(
                    format!(
                        "@RequestHeader(value = \"{}\", required = false) String",
                        block.field
                    ),
                    "authorization",
                ))
                .with_body_line(
                    "String token = authorization == null ? null : \
                     authorization.replaceFirst(\"^Bearer \", \"\");",
                );
            match mode {
                BearerMode::Basic => {
                    logout = logout
                        .with_body_line("if (token == null || !authenticator.validateJwt(token)) {")
                        .with_body_line(
                            "    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);",
                        )
                        .with_body_line("}")
                        .with_body_line("authenticator.logout(token);");
                }
                BearerMode::Full => {
                    class.add_import("com.auth0.jwt.interfaces.DecodedJWT");
                    logout = logout
                        .with_body_line(format!(
                            "DecodedJWT payload = {name}AuthUtil.verifyOrNull(token);"
                        ))
                        .with_body_line("if (payload == null) {")
                        .with_body_line(
                            "    throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);",
                        )
                        .with_body_line("}")
                        .with_body_line("authenticator.logout(payload);");
                }
                BearerMode::None => unreachable!(),
            }
            class.add_method(logout);
        }

        class
    }

    /// CORS configuration classes for the `cors` middleware.
    fn emit_middlewares(
        &self,
        project: &Project,
        classes: &mut Vec<ClassBuilder>,
    ) -> Result<(), EmitError> {
        for middleware in &project.middlewares {
            match middleware.name.as_str() {
                // Spring parses JSON bodies and reads the environment on
                // its own; these directives need no generated code here.
                "json" | "env" => {}
                "cors" => {
                    let origin = match middleware.options.get("origin") {
                        Some(OptionValue::String(origin)) => java_string(origin),
                        Some(OptionValue::Global(global)) => format!(
                            "System.getenv({})",
                            java_string(&global.path.join("."))
                        ),
                        _ => java_string("*"),
                    };

                    let mut mvc =
                        ClassBuilder::class(self.java().config.clone(), "CorsConfigurationMVC");
                    mvc.add_import("org.springframework.context.annotation.Configuration");
                    mvc.add_import(
                        "org.springframework.web.servlet.config.annotation.CorsRegistry",
                    );
                    mvc.add_import(
                        "org.springframework.web.servlet.config.annotation.WebMvcConfigurer",
                    );
                    mvc.add_annotation("@Configuration");
                    mvc.add_implements("WebMvcConfigurer");
                    mvc.add_method(
                        MethodBuilder::new("void", "addCorsMappings")
                            .with_annotation("@Override")
                            .with_parameter(Parameter::new("CorsRegistry", "registry"))
                            .with_body_line(format!(
                                "registry.addMapping(\"/**\").allowedOrigins({origin});"
                            )),
                    );
                    classes.push(mvc);

                    if self.java().use_spring_security {
                        let mut security =
                            ClassBuilder::class(self.java().config.clone(), "CorsConfiguration");
                        security
                            .add_import("org.springframework.context.annotation.Bean");
                        security
                            .add_import("org.springframework.context.annotation.Configuration");
                        security.add_import(
                            "org.springframework.security.config.Customizer",
                        );
                        security.add_import(
                            "org.springframework.security.config.annotation.web.builders.HttpSecurity",
                        );
                        security.add_import(
                            "org.springframework.security.web.SecurityFilterChain",
                        );
                        security.add_annotation("@Configuration");
                        security.add_method(
                            MethodBuilder::new("SecurityFilterChain", "filterChain")
                                .with_annotation("@Bean")
                                .with_parameter(Parameter::new("HttpSecurity", "http"))
                                .with_throws("Exception")
                                .with_body_line(
                                    "http.cors(Customizer.withDefaults()).csrf(csrf -> csrf.disable());",
                                )
                                .with_body_line("return http.build();"),
                        );
                        classes.push(security);
                    }
                }
                other => {
                    return Err(EmitError::UnknownMiddleware {
                        name: other.to_string(),
                        at: middleware.pos.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// DTO classes deduplicated by the canonical option hash.
struct DtoRegistry {
    package: String,
    by_hash: IndexMap<String, String>,
    classes: Vec<ClassBuilder>,
}

impl DtoRegistry {
    fn new(package: String) -> Self {
        Self {
            package,
            by_hash: IndexMap::new(),
            classes: Vec::new(),
        }
    }

    /// The DTO class name for a body schema, creating it on first use.
    fn dto_for(
        &mut self,
        chain: &str,
        route: &Route,
        schema: &OptionMap,
    ) -> Result<String, EmitError> {
        let hash = option_hash(schema);
        if let Some(existing) = self.by_hash.get(&hash) {
            return Ok(existing.clone());
        }

        let name = format!("{chain}{}Body", route.path.display_name());
        let class = self.build_dto(&name, schema)?;
        self.classes.push(class);
        self.by_hash.insert(hash, name.clone());
        Ok(name)
    }

    fn build_dto(&self, name: &str, schema: &OptionMap) -> Result<ClassBuilder, EmitError> {
        let mut class = ClassBuilder::class(self.package.clone(), name.to_string());

        for (key, value) in schema {
            let field_name = java_ident(key);
            let ty = match value {
                OptionValue::Map(nested) => {
                    let inner_name = ident::capitalize(&java_ident(key));
                    let inner = self.build_dto(&inner_name, nested)?;
                    class.add_inner_class(inner)?;
                    inner_name
                }
                other => schema_java_type(other, &mut class).to_string(),
            };

            class.add_field(FieldBuilder::new(ty.clone(), field_name.clone()));

            let accessor = ident::capitalize(&field_name);
            class.add_method(
                MethodBuilder::new(ty.clone(), format!("get{accessor}"))
                    .with_body_line(format!("return {field_name};")),
            );
            class.add_method(
                MethodBuilder::new("void", format!("set{accessor}"))
                    .with_parameter(Parameter::new(ty, field_name.clone()))
                    .with_body_line(format!("this.{field_name} = {field_name};")),
            );
        }

        Ok(class)
    }

    fn finish(self) -> Vec<ClassBuilder> {
        self.classes
    }
}

/// Java type for a query parameter.
fn java_type(ty: ParamType, class: &mut ClassBuilder) -> String {
    match ty {
        ParamType::Any => "Object".to_string(),
        ParamType::String => "String".to_string(),
        ParamType::Int => "long".to_string(),
        ParamType::Float => "double".to_string(),
        ParamType::Bool => "boolean".to_string(),
        ParamType::Date => {
            class.add_import("java.time.LocalDate");
            "LocalDate".to_string()
        }
        ParamType::DateTime => {
            class.add_import("java.time.LocalDateTime");
            "LocalDateTime".to_string()
        }
        ParamType::Time => {
            class.add_import("java.time.LocalTime");
            "LocalTime".to_string()
        }
    }
}

/// Java type for a body schema entry.
fn schema_java_type(value: &OptionValue, class: &mut ClassBuilder) -> &'static str {
    match value.as_str() {
        Some("string") => "String",
        Some("int") => "long",
        Some("float") => "double",
        Some("boolean") => "boolean",
        Some("date") => {
            class.add_import("java.time.LocalDate");
            "LocalDate"
        }
        Some("datetime") => {
            class.add_import("java.time.LocalDateTime");
            "LocalDateTime"
        }
        Some("time") => {
            class.add_import("java.time.LocalTime");
            "LocalTime"
        }
        _ => "Object",
    }
}

/// The controller base path: the accumulated prefix with braced variables.
fn braced_prefix(prefix: &str) -> String {
    let braced: Vec<String> = prefix
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect();
    let joined = braced.join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

fn java_secret(block: &AuthBlock) -> String {
    match block.options.get("secret") {
        Some(OptionValue::String(secret)) => java_string(secret),
        Some(OptionValue::Global(global)) => {
            format!("System.getenv({})", java_string(&global.path.join(".")))
        }
        _ => java_string("ymir-secret"),
    }
}

fn expires_seconds(block: &AuthBlock) -> i64 {
    match block.options.get("expiresIn") {
        Some(OptionValue::Number(seconds)) => *seconds as i64,
        _ => 3600,
    }
}

fn java_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// A valid lower-camel Java identifier for a script-level name.
fn java_ident(raw: &str) -> String {
    lower_first(&ident::sanitize(raw))
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ymir_parser::{ParsePolicy, parse_source};

    fn emit(source: &str) -> Vec<GeneratedFile> {
        let project = parse_source(source, ParsePolicy::CancelOnFirstError).unwrap();
        let emitter = JavaEmitter::new(EmitterConfig::default());
        emitter.emit(&project).unwrap()
    }

    fn file<'a>(files: &'a [GeneratedFile], suffix: &str) -> &'a GeneratedFile {
        files
            .iter()
            .find(|f| f.path.to_string_lossy().ends_with(suffix))
            .unwrap_or_else(|| panic!("missing file `{suffix}`"))
    }

    #[test]
    fn test_controller_and_handler_pair() {
        let files = emit(
            "target Java_SpringBoot;\n\
             router /api { GET /hello?name=string as Hello; }\n",
        );

        let controller = file(&files, "controller/ApiController.java");
        assert!(controller.contents.contains("@RestController"));
        assert!(controller.contents.contains("@RequestMapping(\"/api\")"));
        assert!(controller.contents.contains(
            "@RequestMapping(path = \"/hello\", method = RequestMethod.GET)"
        ));
        assert!(controller.contents.contains(
            "public Object getApiHello(@RequestParam(\"name\") String name) {"
        ));
        assert!(controller.contents.contains("return handler.getApiHello(name);"));

        let handler = file(&files, "controller/ApiControllerHandler.java");
        assert!(handler
            .contents
            .contains("public interface ApiControllerHandler {"));
        assert!(handler.contents.contains("Object getApiHello(String name);"));
    }

    #[test]
    fn test_path_variables_become_annotations() {
        let files = emit(
            "target Java_SpringBoot;\n\
             router /api { GET /users/:id as UserById; }\n",
        );

        let controller = file(&files, "controller/ApiController.java");
        assert!(controller.contents.contains(
            "@RequestMapping(path = \"/users/{id}\", method = RequestMethod.GET)"
        ));
        assert!(controller
            .contents
            .contains("@PathVariable(\"id\") String id"));
    }

    #[test]
    fn test_query_parameter_type_mapping() {
        let files = emit(
            "target Java_SpringBoot;\n\
             GET /search?q=string&limit=int&ratio=float&active=boolean&since=date as Search;\n",
        );

        let controller = file(&files, "controller/RootController.java");
        assert!(controller.contents.contains("@RequestParam(\"q\") String q"));
        assert!(controller.contents.contains("@RequestParam(\"limit\") long limit"));
        assert!(controller.contents.contains("@RequestParam(\"ratio\") double ratio"));
        assert!(controller
            .contents
            .contains("@RequestParam(\"active\") boolean active"));
        assert!(controller
            .contents
            .contains("@RequestParam(\"since\") LocalDate since"));
        assert!(controller.contents.contains("import java.time.LocalDate;"));
    }

    #[test]
    fn test_header_schema_becomes_request_headers() {
        let files = emit(
            "target Java_SpringBoot;\n\
             router /api header(X-Token: string) { GET /x as X; }\n",
        );

        let controller = file(&files, "controller/ApiController.java");
        assert!(controller
            .contents
            .contains("@RequestHeader(\"X-Token\") String xToken"));
    }

    #[test]
    fn test_dto_generation_and_dedup() {
        let files = emit(
            "target Java_SpringBoot;\n\
             router /api {\n\
                 POST /a as CreateA body(name: string, meta: {tag: string});\n\
                 POST /b as CreateB body(name: string, meta: {tag: string});\n\
             }\n",
        );

        // Identical schemas collapse onto one DTO class.
        let dto_files: Vec<_> = files
            .iter()
            .filter(|f| f.path.to_string_lossy().contains("/dto/"))
            .collect();
        assert_eq!(dto_files.len(), 1);

        let dto = file(&files, "dto/ApiCreateABody.java");
        assert!(dto.contents.contains("public class ApiCreateABody {"));
        assert!(dto.contents.contains("private String name;"));
        assert!(dto.contents.contains("public class Meta {"));
        assert!(dto.contents.contains("public String getName() {"));

        // Both controller methods use the same DTO type.
        let controller = file(&files, "controller/ApiController.java");
        assert!(controller.contents.contains("@RequestBody ApiCreateABody"));
        assert_eq!(
            controller.contents.matches("@RequestBody ApiCreateABody").count(),
            2
        );
    }

    #[test]
    fn test_nested_router_prefix_composition() {
        let files = emit(
            "target Java_SpringBoot;\n\
             router /api { router /users { GET /:id as UserById; } }\n",
        );

        let controller = file(&files, "controller/ApiUsersController.java");
        assert!(controller.contents.contains("@RequestMapping(\"/api/users\")"));
        assert!(controller.contents.contains("getApiUsersUserById"));
    }

    #[test]
    fn test_api_key_authenticator() {
        let files = emit(
            "target Java_SpringBoot;\n\
             auth API-Key as key (source: header, field: \"X-Api-Key\");\n\
             GET /secret as Secret authenticate key with [\"admin\"];\n",
        );

        let iface = file(&files, "auth/KeyAuthenticator.java");
        assert!(iface.contents.contains("boolean authenticate(String apiKey);"));
        assert!(iface
            .contents
            .contains("boolean authorize(String credential, List<String> roles);"));

        let controller = file(&files, "controller/RootController.java");
        assert!(controller.contents.contains(
            "@RequestHeader(value = \"X-Api-Key\", required = false) String authCredential"
        ));
        assert!(controller
            .contents
            .contains("throw new ResponseStatusException(HttpStatus.UNAUTHORIZED);"));
        assert!(controller
            .contents
            .contains("keyAuthenticator.authorize(authCredential, List.of(\"admin\"))"));
    }

    #[test]
    fn test_bearer_full_generates_util_and_controller() {
        let files = emit(
            "target Java_SpringBoot;\n\
             auth Bearer as apiKey (source: header, defaultAccess: authenticated, \
             mode: \"FULL\", withLogout: true, secret: @env.JWT_SECRET);\n\
             router /api { GET /me as Me; }\n",
        );

        let util = file(&files, "auth/ApiKeyAuthUtil.java");
        assert!(util
            .contents
            .contains("Algorithm.HMAC256(System.getenv(\"JWT_SECRET\"))"));
        assert!(util.contents.contains("public static String sign(Map<String, Object> payload) {"));
        assert!(util.contents.contains("public static DecodedJWT verifyOrNull(String token) {"));

        let auth_controller = file(&files, "auth/ApiKeyAuthController.java");
        assert!(auth_controller.contents.contains(
            "@RequestMapping(path = \"/login\", method = RequestMethod.POST)"
        ));
        assert!(auth_controller.contents.contains(
            "@RequestMapping(path = \"/logout\", method = RequestMethod.POST)"
        ));
        assert!(auth_controller
            .contents
            .contains("authenticator.getJwtPayload("));

        // The default clause guards every route.
        let api_controller = file(&files, "controller/ApiController.java");
        assert!(api_controller
            .contents
            .contains("ApiKeyAuthUtil.verifyOrNull(bearerToken)"));
    }

    #[test]
    fn test_cors_configuration() {
        let files = emit("target Java_SpringBoot;\nuse cors(origin: \"https://a.example\");\n");
        let cors = file(&files, "config/CorsConfigurationMVC.java");
        assert!(cors
            .contents
            .contains("registry.addMapping(\"/**\").allowedOrigins(\"https://a.example\");"));
    }

    #[test]
    fn test_cors_with_spring_security() {
        let project = parse_source(
            "target Java_SpringBoot;\nuse cors;\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let mut config = EmitterConfig::default();
        config.java.use_spring_security = true;
        let files = JavaEmitter::new(config).emit(&project).unwrap();

        let security = file(&files, "config/CorsConfiguration.java");
        assert!(security.contents.contains("SecurityFilterChain"));
        assert!(security.contents.contains("@Bean"));
    }

    #[test]
    fn test_append_request_config() {
        let project = parse_source(
            "target Java_SpringBoot;\nGET /x as X;\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let mut config = EmitterConfig::default();
        config.java.append_request = true;
        let files = JavaEmitter::new(config).emit(&project).unwrap();

        let controller = file(&files, "controller/RootController.java");
        assert!(controller.contents.contains("HttpServletRequest request"));
        assert!(controller.contents.contains("return handler.getX(request);"));
    }

    #[test]
    fn test_unknown_middleware_rejected() {
        let project = parse_source(
            "target Java_SpringBoot;\nuse telepathy;\n",
            ParsePolicy::CancelOnFirstError,
        )
        .unwrap();
        let emitter = JavaEmitter::new(EmitterConfig::default());
        assert!(matches!(
            emitter.emit(&project),
            Err(EmitError::UnknownMiddleware { .. })
        ));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let source = "target Java_SpringBoot;\n\
                      auth Bearer as apiKey (source: header, mode: \"FULL\");\n\
                      router /api { POST /items as CreateItem body(name: string) \
                      authenticate apiKey; }\n";
        let a = emit(source);
        let b = emit(source);
        assert_eq!(a, b);
    }
}
