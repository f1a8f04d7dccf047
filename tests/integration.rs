use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docqa");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[server]
bind = "127.0.0.1:0"

[storage]
document_dir = "{root}/document_store"
index_dir = "{root}/vector_index"
users_file = "{root}/users.json"

[chunking]
chunk_size = 500
chunk_overlap = 50
"#,
        root = root.display()
    );

    let config_path = config_dir.join("docqa.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docqa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docqa_binary();
    let cwd = config_path.parent().unwrap().parent().unwrap();
    let output = Command::new(&binary)
        .current_dir(cwd)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("GROQ_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docqa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_creates_storage() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_docqa(&config, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("Initialized"));

    assert!(tmp.path().join("document_store").is_dir());
    assert!(tmp.path().join("vector_index").join("index.sqlite").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config) = setup_test_env();
    let (_, _, first) = run_docqa(&config, &["init"]);
    let (_, stderr, second) = run_docqa(&config, &["init"]);
    assert!(first);
    assert!(second, "second init failed: {}", stderr);
}

#[test]
fn test_serve_requires_api_key() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_docqa(&config, &["serve"]);
    assert!(!success);
    assert!(stderr.contains("GROQ_API_KEY"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config) = setup_test_env();
    fs::write(&config, "[chunking]\nchunk_size = 50\nchunk_overlap = 50\n").unwrap();
    let (_, stderr, success) = run_docqa(&config, &["init"]);
    assert!(!success);
    assert!(!stderr.is_empty());
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let binary = docqa_binary();
    let output = Command::new(&binary)
        .current_dir(tmp.path())
        .args(["--config", "./config/absent.toml", "init"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(tmp.path().join("document_store").is_dir());
    assert!(tmp.path().join("vector_index").join("index.sqlite").is_file());
}
