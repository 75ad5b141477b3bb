use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// The binary, isolated from the caller's config, API key and locale.
fn eduforge_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_eduforge"));
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("config-home"))
        .env("HOME", tmp.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("EDUFORGE_OUTPUT_DIR")
        .env_remove("EDUFORGE_LOCALE")
        .env_remove("EDUFORGE_MODEL")
        .env_remove("RUST_LOG");
    cmd
}

fn run(tmp: &TempDir, args: &[&str]) -> Output {
    eduforge_cmd(tmp).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_spec(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

const BOUNCING_BALL: &str = r#"{
  "title": "Bouncing Ball",
  "audience": "grade 5",
  "description": "gravity demo",
  "initial": "a red ball at top of canvas"
}"#;

const WITH_RULES: &str = r#"{
  "title": "Bouncing Ball",
  "audience": "grade 5",
  "description": "gravity demo",
  "initial": "a red ball at top of canvas",
  "interactions": [
    { "if": "ball is clicked", "then_first": "ball turns blue", "then_next": ["ball turns green"] }
  ],
  "extras": "use p5.js"
}"#;

fn saved_artifact(root: &Path, name: &str) -> std::path::PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.html"), "<html><body>ball</body></html>").unwrap();
    dir
}

#[test]
fn test_new_writes_valid_template() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["new", "tool.json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(tmp.path().join("tool.json").is_file());

    let output = run(&tmp, &["validate", "tool.json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("OK:"));
}

#[test]
fn test_new_yaml_template() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["new", "tool.yaml"]);
    assert!(output.status.success());

    let content = fs::read_to_string(tmp.path().join("tool.yaml")).unwrap();
    assert!(content.contains("title:"));
    assert!(!content.trim_start().starts_with('{'));

    let output = run(&tmp, &["validate", "tool.yaml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn test_new_refuses_to_overwrite() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("tool.json"), "keep me").unwrap();

    let output = run(&tmp, &["new", "tool.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
    assert_eq!(
        fs::read_to_string(tmp.path().join("tool.json")).unwrap(),
        "keep me"
    );

    let output = run(&tmp, &["new", "tool.json", "--force"]);
    assert!(output.status.success());
}

#[test]
fn test_validate_reports_each_missing_field() {
    let tmp = TempDir::new().unwrap();
    let spec = write_spec(tmp.path(), "spec.json", r#"{ "title": "Ball", "audience": "  " }"#);

    let output = run(&tmp, &["validate", &spec]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("Concept description is required."));
    assert!(err.contains("Target audience is required."));
    assert!(err.contains("Initial view is required."));
    assert!(!err.contains("Tool title is required."));
    assert!(err.contains("Fill in all required fields!"));
    assert!(err.contains("Error: Missing required fields: description, audience, initial"));
}

#[test]
fn test_validate_in_serbian() {
    let tmp = TempDir::new().unwrap();
    let spec = write_spec(tmp.path(), "spec.json", "{}");

    let output = run(&tmp, &["--locale", "sr", "validate", &spec]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("Naziv alata je obavezno."));
    assert!(err.contains("Popuni sva obavezna polja!"));
}

#[test]
fn test_validate_malformed_file() {
    let tmp = TempDir::new().unwrap();
    let spec = write_spec(tmp.path(), "spec.json", "{ \"title\": ");

    let output = run(&tmp, &["validate", &spec]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Import failed"));
}

#[test]
fn test_prompt_without_rules_or_extras() {
    let tmp = TempDir::new().unwrap();
    let spec = write_spec(tmp.path(), "spec.json", BOUNCING_BALL);

    let output = run(&tmp, &["prompt", &spec, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let request: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let payload = &request["payload"];
    assert_eq!(payload["title"], "Bouncing Ball");
    assert_eq!(payload["initial"], "a red ball at top of canvas");
    assert!(payload.get("interactions").is_none());
    assert!(payload.get("extras").is_none());

    let instruction = request["instruction"].as_str().unwrap();
    let goal = instruction.find("<goal>").unwrap();
    let fields = instruction.find("<instruction>").unwrap();
    let output_block = instruction.find("<output>").unwrap();
    assert!(goal < fields && fields < output_block);
    assert!(!instruction.contains("<interactions>"));
    assert!(!instruction.contains("<extras>"));
}

#[test]
fn test_prompt_with_rules_and_extras() {
    let tmp = TempDir::new().unwrap();
    let spec = write_spec(tmp.path(), "spec.json", WITH_RULES);

    let output = run(&tmp, &["prompt", &spec, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let request: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = request["payload"]["interactions"].as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["if"], "ball is clicked");
    assert_eq!(rules[0]["then_next"][0], "ball turns green");
    assert_eq!(request["payload"]["extras"], "use p5.js");

    let instruction = request["instruction"].as_str().unwrap();
    let order: Vec<usize> = ["<goal>", "<instruction>", "<interactions>", "<extras>", "<output>"]
        .iter()
        .map(|tag| instruction.find(tag).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));

    let content = request["content"].as_str().unwrap();
    assert!(content.starts_with("<content>"));
    assert!(content.ends_with("</content>"));
}

#[test]
fn test_prompt_warns_about_dropped_rules() {
    let tmp = TempDir::new().unwrap();
    let body = r#"{
      "title": "Ball", "audience": "kids", "description": "d", "initial": "i",
      "interactions": [{ "if": "  ", "then_first": "nothing" }]
    }"#;
    let spec = write_spec(tmp.path(), "spec.json", body);

    let output = run(&tmp, &["prompt", &spec]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("1 interaction rule(s) without a condition"));
    assert!(!stdout(&output).contains("<interactions>"));
}

#[test]
fn test_generate_with_missing_fields_fails_before_backend() {
    let tmp = TempDir::new().unwrap();
    let spec = write_spec(tmp.path(), "spec.json", r#"{ "title": "Ball" }"#);

    let output = run(&tmp, &["generate", &spec, "--output-dir", "out"]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("Missing required fields"));
    assert!(!err.contains("OPENAI_API_KEY"));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_generate_without_api_key() {
    let tmp = TempDir::new().unwrap();
    let spec = write_spec(tmp.path(), "spec.json", BOUNCING_BALL);

    let output = run(&tmp, &["generate", &spec, "--output-dir", "out"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("OPENAI_API_KEY is not set"));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_list_empty() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["list"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No saved tools"));

    let output = run(&tmp, &["list", "--json"]);
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list, serde_json::json!([]));
}

#[test]
fn test_archive_missing_directory() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["archive", "generated/Nothing_2025-01-01_00_00_00"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not found"));
    assert!(!tmp.path().join("generated").exists());
}

#[test]
fn test_archive_then_list() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("generated");
    saved_artifact(&root, "Old_Tool_2025-01-01_08_00_00");
    let newest = saved_artifact(&root, "Bouncing_Ball_2025-03-14_09_26_53");

    let output = run(&tmp, &["archive", newest.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(root.join("Bouncing_Ball_2025-03-14_09_26_53.zip").is_file());
    assert!(newest.join("index.html").is_file());

    let output = run(&tmp, &["list", "--json"]);
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "Bouncing_Ball_2025-03-14_09_26_53");
    assert_eq!(list[0]["title"], "Bouncing_Ball");
    assert!(list[0]["archive"].is_string());
    assert!(list[1]["archive"].is_null());
}

#[test]
fn test_output_dir_from_config_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("eduforge.toml"), "output_dir = \"site\"\n").unwrap();
    saved_artifact(&tmp.path().join("site"), "Ball_2025-01-01_08_00_00");

    let output = run(&tmp, &["list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Ball_2025-01-01_08_00_00"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["--config", "nope.toml", "list"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope.toml"));
}

#[test]
fn test_revise_blank_instruction_fails_before_backend() {
    let tmp = TempDir::new().unwrap();
    let dir = saved_artifact(&tmp.path().join("generated"), "Ball_2025-01-01_08_00_00");

    let output = run(&tmp, &["revise", dir.to_str().unwrap(), "   "]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Instruction is empty"));
    assert!(!err.contains("OPENAI_API_KEY"));
}

#[test]
fn test_revise_unknown_artifact() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["revise", "generated/Gone_2025-01-01_08_00_00", "make it blue"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not found"));
}

#[test]
fn test_revise_oversized_request() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("eduforge.toml"), "max_request_bytes = 64\n").unwrap();
    let dir = saved_artifact(&tmp.path().join("generated"), "Ball_2025-01-01_08_00_00");

    let output = run(&tmp, &["revise", dir.to_str().unwrap(), "make the ball blue"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Request too large"));
}

#[test]
fn test_describe_rejects_unknown_image_type() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("sketch.bmp"), [0u8; 4]).unwrap();

    let output = run(&tmp, &["describe", "sketch.bmp"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unsupported image type"));
}
