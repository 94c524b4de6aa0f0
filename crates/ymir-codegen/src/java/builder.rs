//! Class/method/field builder IR for the Java emitter.
//!
//! Generated Java files are assembled as data first and rendered in a
//! single terminal step: a [`ClassBuilder`] collects imports (deduplicated,
//! order preserved), annotations, fields (deduplicated by name), methods,
//! and inner classes, and `render()` produces the final source text with a
//! leading auto-generated comment.

use std::fmt;

use crate::EmitError;

/// Java access modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
    Private,
    PackagePrivate,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => write!(f, "public "),
            Access::Protected => write!(f, "protected "),
            Access::Private => write!(f, "private "),
            Access::PackagePrivate => Ok(()),
        }
    }
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    pub access: Access,
    pub ty: String,
    pub name: String,
    pub annotations: Vec<String>,
    pub initializer: Option<String>,
    pub is_static_final: bool,
}

impl FieldBuilder {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            access: Access::Private,
            ty: ty.into(),
            name: name.into(),
            annotations: Vec::new(),
            initializer: None,
            is_static_final: false,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn with_initializer(mut self, value: impl Into<String>) -> Self {
        self.initializer = Some(value.into());
        self
    }

    pub fn static_final(mut self) -> Self {
        self.is_static_final = true;
        self
    }

    fn render(&self, out: &mut Vec<String>, indent: &str) {
        for annotation in &self.annotations {
            out.push(format!("{indent}{annotation}"));
        }
        let modifiers = if self.is_static_final {
            "static final "
        } else {
            ""
        };
        let init = match &self.initializer {
            Some(value) => format!(" = {value}"),
            None => String::new(),
        };
        out.push(format!(
            "{indent}{}{modifiers}{} {}{init};",
            self.access, self.ty, self.name
        ));
    }
}

/// A method parameter: rendered type (annotations included) and name.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub ty: String,
    pub name: String,
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

/// A method declaration with an optional body.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    pub access: Access,
    pub is_static: bool,
    pub return_type: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub annotations: Vec<String>,
    pub throws: Vec<String>,
    pub comment: Vec<String>,
    pub body: Vec<String>,
}

impl MethodBuilder {
    pub fn new(return_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            access: Access::Public,
            is_static: false,
            return_type: return_type.into(),
            name: name.into(),
            parameters: Vec::new(),
            annotations: Vec::new(),
            throws: Vec::new(),
            comment: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn make_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn with_throws(mut self, exception: impl Into<String>) -> Self {
        self.throws.push(exception.into());
        self
    }

    pub fn with_comment(mut self, line: impl Into<String>) -> Self {
        self.comment.push(line.into());
        self
    }

    pub fn with_body_line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }

    /// Render the method. In an interface the body is dropped and the
    /// declaration becomes a stub.
    fn render(&self, out: &mut Vec<String>, indent: &str, in_interface: bool) {
        if !self.comment.is_empty() {
            out.push(format!("{indent}/**"));
            for line in &self.comment {
                out.push(format!("{indent} * {line}"));
            }
            out.push(format!("{indent} */"));
        }
        for annotation in &self.annotations {
            out.push(format!("{indent}{annotation}"));
        }

        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect();
        let throws = if self.throws.is_empty() {
            String::new()
        } else {
            format!(" throws {}", self.throws.join(", "))
        };
        let access = if in_interface {
            String::new()
        } else {
            self.access.to_string()
        };
        let modifiers = if self.is_static { "static " } else { "" };
        let signature = format!(
            "{indent}{access}{modifiers}{} {}({}){throws}",
            self.return_type,
            self.name,
            params.join(", ")
        );

        if in_interface {
            out.push(format!("{signature};"));
            return;
        }

        out.push(format!("{signature} {{"));
        for line in &self.body {
            if line.is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("{indent}    {line}"));
            }
        }
        out.push(format!("{indent}}}"));
    }
}

/// A class or interface declaration.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    pub package: String,
    pub name: String,
    pub is_interface: bool,
    imports: Vec<String>,
    annotations: Vec<String>,
    fields: Vec<FieldBuilder>,
    methods: Vec<MethodBuilder>,
    inner_classes: Vec<ClassBuilder>,
    implements: Vec<String>,
}

impl ClassBuilder {
    pub fn class(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(package, name, false)
    }

    pub fn interface(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(package, name, true)
    }

    fn new(package: impl Into<String>, name: impl Into<String>, is_interface: bool) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            is_interface,
            imports: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            implements: Vec::new(),
        }
    }

    /// Add an import; duplicates are dropped, first-seen order is kept.
    pub fn add_import(&mut self, import: impl Into<String>) {
        let import = import.into();
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    pub fn add_annotation(&mut self, annotation: impl Into<String>) {
        self.annotations.push(annotation.into());
    }

    /// Add a field; a field with an already-present name is dropped.
    pub fn add_field(&mut self, field: FieldBuilder) {
        if !self.fields.iter().any(|f| f.name == field.name) {
            self.fields.push(field);
        }
    }

    pub fn add_method(&mut self, method: MethodBuilder) {
        self.methods.push(method);
    }

    /// Add an inner class. Interfaces reject inner classes.
    pub fn add_inner_class(&mut self, inner: ClassBuilder) -> Result<(), EmitError> {
        if self.is_interface {
            return Err(EmitError::Unsupported {
                what: format!(
                    "interface `{}` cannot hold inner class `{}`",
                    self.name, inner.name
                ),
                at: "java builder".to_string(),
            });
        }
        self.inner_classes.push(inner);
        Ok(())
    }

    pub fn add_implements(&mut self, interface: impl Into<String>) {
        self.implements.push(interface.into());
    }

    /// Path of the rendered file relative to the source root.
    pub fn file_path(&self) -> String {
        format!("{}/{}.java", self.package.replace('.', "/"), self.name)
    }

    /// Render the complete Java source file.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        out.push("// Generated by the Ymir compiler. Do not edit.".to_string());
        out.push(format!("package {};", self.package));
        out.push(String::new());

        if !self.imports.is_empty() {
            for import in &self.imports {
                out.push(format!("import {import};"));
            }
            out.push(String::new());
        }

        self.render_declaration(&mut out, "");
        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    fn render_declaration(&self, out: &mut Vec<String>, indent: &str) {
        for annotation in &self.annotations {
            out.push(format!("{indent}{annotation}"));
        }

        let kind = if self.is_interface {
            "interface"
        } else {
            "class"
        };
        let implements = if self.implements.is_empty() {
            String::new()
        } else {
            format!(" implements {}", self.implements.join(", "))
        };
        out.push(format!(
            "{indent}public {kind} {}{implements} {{",
            self.name
        ));

        let body_indent = format!("{indent}    ");

        for field in &self.fields {
            field.render(out, &body_indent);
        }
        if !self.fields.is_empty() {
            out.push(String::new());
        }

        for (i, method) in self.methods.iter().enumerate() {
            if i > 0 {
                out.push(String::new());
            }
            method.render(out, &body_indent, self.is_interface);
        }

        for inner in &self.inner_classes {
            if !self.fields.is_empty() || !self.methods.is_empty() {
                out.push(String::new());
            }
            inner.render_inner(out, &body_indent);
        }

        out.push(format!("{indent}}}"));
    }

    fn render_inner(&self, out: &mut Vec<String>, indent: &str) {
        // Inner classes carry no package or imports of their own.
        self.render_declaration(out, indent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_class() {
        let mut class = ClassBuilder::class("com.example", "Greeter");
        class.add_import("java.util.List");
        class.add_import("java.util.List"); // deduplicated
        class.add_field(FieldBuilder::new("String", "name"));
        class.add_method(
            MethodBuilder::new("String", "greet")
                .with_body_line("return \"hello \" + name;"),
        );

        let rendered = class.render();
        assert!(rendered.starts_with("// Generated by the Ymir compiler."));
        assert!(rendered.contains("package com.example;"));
        assert_eq!(rendered.matches("import java.util.List;").count(), 1);
        assert!(rendered.contains("public class Greeter {"));
        assert!(rendered.contains("    private String name;"));
        assert!(rendered.contains("    public String greet() {"));
        assert!(rendered.contains("        return \"hello \" + name;"));
    }

    #[test]
    fn test_interface_methods_are_stubs() {
        let mut iface = ClassBuilder::interface("com.example", "Handler");
        iface.add_method(
            MethodBuilder::new("Object", "getApiHello")
                .with_parameter(Parameter::new("String", "name"))
                .with_body_line("ignored"),
        );

        let rendered = iface.render();
        assert!(rendered.contains("public interface Handler {"));
        assert!(rendered.contains("    Object getApiHello(String name);"));
        assert!(!rendered.contains("ignored"));
    }

    #[test]
    fn test_interface_rejects_inner_classes() {
        let mut iface = ClassBuilder::interface("com.example", "Handler");
        let inner = ClassBuilder::class("com.example", "Inner");
        assert!(iface.add_inner_class(inner).is_err());
    }

    #[test]
    fn test_inner_class_render() {
        let mut class = ClassBuilder::class("com.example", "Outer");
        let mut inner = ClassBuilder::class("com.example", "Inner");
        inner.add_field(FieldBuilder::new("long", "id"));
        class.add_inner_class(inner).unwrap();

        let rendered = class.render();
        assert!(rendered.contains("    public class Inner {"));
        assert!(rendered.contains("        private long id;"));
        // The inner class does not repeat the package declaration.
        assert_eq!(rendered.matches("package com.example;").count(), 1);
    }

    #[test]
    fn test_field_dedup_by_name() {
        let mut class = ClassBuilder::class("com.example", "C");
        class.add_field(FieldBuilder::new("String", "value"));
        class.add_field(FieldBuilder::new("long", "value"));

        let rendered = class.render();
        assert!(rendered.contains("private String value;"));
        assert!(!rendered.contains("private long value;"));
    }

    #[test]
    fn test_annotations_and_throws() {
        let mut class = ClassBuilder::class("com.example", "C");
        class.add_annotation("@RestController");
        class.add_method(
            MethodBuilder::new("void", "run")
                .with_annotation("@Override")
                .with_throws("java.io.IOException"),
        );

        let rendered = class.render();
        assert!(rendered.contains("@RestController\npublic class C {"));
        assert!(rendered.contains("    @Override\n    public void run() throws java.io.IOException {"));
    }

    #[test]
    fn test_static_final_field_with_initializer() {
        let mut class = ClassBuilder::class("com.example", "C");
        class.add_field(
            FieldBuilder::new("String", "SECRET")
                .with_initializer("System.getenv(\"SECRET\")")
                .static_final(),
        );

        let rendered = class.render();
        assert!(rendered.contains("private static final String SECRET = System.getenv(\"SECRET\");"));
    }

    #[test]
    fn test_file_path() {
        let class = ClassBuilder::class("com.ymir.app.controller", "ApiController");
        assert_eq!(
            class.file_path(),
            "com/ymir/app/controller/ApiController.java"
        );
    }
}
