//! End-to-end smoke tests: compile small scripts into a temp directory
//! and assert on the generated artifacts.

use std::fs;

use tempfile::TempDir;

use ymir_cli::{Args, YmirError, run};

fn args(input: &str, output: &str) -> Args {
    Args {
        input: input.to_string(),
        output: Some(output.to_string()),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn test_express_end_to_end() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("main.ymr");
    fs::write(
        &script,
        "target JavaScript_ExpressJS;\n\
         use json;\n\
         router /api {\n\
             // Greets the caller\n\
             GET /hello?name=string as Hello;\n\
         }\n",
    )
    .unwrap();

    let out = dir.path().join("build");
    run(&args(
        script.to_str().unwrap(),
        out.to_str().unwrap(),
    ))
    .unwrap();

    let generated = fs::read_to_string(out.join("YmirRestBase.js")).unwrap();
    assert!(generated.contains("class YmirRestBase {"));
    assert!(generated.contains("async onApiHello(req, res) {"));
    assert!(generated.contains("app.use(\"/api\", apiRouter);"));
}

#[test]
fn test_java_end_to_end_with_config() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("main.ymr");
    fs::write(
        &script,
        "target Java_SpringBoot;\n\
         router /api { POST /items as CreateItem body(name: string); }\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("ymir.json"),
        r#"{ "target": { "controller": "org.acme.web", "dto": "org.acme.dto" } }"#,
    )
    .unwrap();

    let out = dir.path().join("build");
    run(&args(
        script.to_str().unwrap(),
        out.to_str().unwrap(),
    ))
    .unwrap();

    let controller = out.join("src/main/java/org/acme/web/ApiController.java");
    let contents = fs::read_to_string(&controller).unwrap();
    assert!(contents.contains("package org.acme.web;"));
    assert!(contents.contains("@RestController"));

    assert!(out
        .join("src/main/java/org/acme/dto/ApiCreateItemBody.java")
        .exists());
}

#[test]
fn test_include_across_files() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.ymr"),
        "target JavaScript_ExpressJS;\nrouter /api { include \"sub.ymr\"; }\n",
    )
    .unwrap();
    fs::write(dir.path().join("sub.ymr"), "GET /x as X;\n").unwrap();

    let out = dir.path().join("build");
    run(&args(
        dir.path().join("main.ymr").to_str().unwrap(),
        out.to_str().unwrap(),
    ))
    .unwrap();

    let generated = fs::read_to_string(out.join("YmirRestBase.js")).unwrap();
    assert!(generated.contains("async onApiX(req, res) {"));
}

#[test]
fn test_frontend_output() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("main.ymr");
    fs::write(
        &script,
        "target JavaScript_ExpressJS;\n\
         router /api { POST /users as CreateUser body(name: string) render form; }\n",
    )
    .unwrap();
    fs::write(dir.path().join("ymir.json"), r#"{ "frontend": {} }"#).unwrap();

    let out = dir.path().join("build");
    run(&args(
        script.to_str().unwrap(),
        out.to_str().unwrap(),
    ))
    .unwrap();

    assert!(out.join("frontend/styles.css").exists());
    assert!(out.join("frontend/client.js").exists());
    let page = fs::read_to_string(out.join("frontend/createuser.html")).unwrap();
    assert!(page.contains("<input name=\"name\" type=\"text\">"));
}

#[test]
fn test_parse_failure_exits_with_compile_error() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("broken.ymr");
    fs::write(&script, "router /api {}\n").unwrap();

    let out = dir.path().join("build");
    let result = run(&args(
        script.to_str().unwrap(),
        out.to_str().unwrap(),
    ));
    assert!(matches!(result, Err(YmirError::Compile { .. })));
    // No partial output is left behind.
    assert!(!out.exists());
}

#[test]
fn test_unknown_target_is_rejected() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("main.ymr");
    fs::write(&script, "target Cobol;\nGET /x as X;\n").unwrap();

    let result = run(&args(
        script.to_str().unwrap(),
        dir.path().join("build").to_str().unwrap(),
    ));
    assert!(matches!(result, Err(YmirError::Emit(_))));
}

#[test]
fn test_output_dir_is_recreated() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("main.ymr");
    fs::write(&script, "target JavaScript_ExpressJS;\nGET /x as X;\n").unwrap();

    let out = dir.path().join("build");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("stale.txt"), "old artifact").unwrap();

    run(&args(
        script.to_str().unwrap(),
        out.to_str().unwrap(),
    ))
    .unwrap();

    assert!(!out.join("stale.txt").exists());
    assert!(out.join("YmirRestBase.js").exists());
}
