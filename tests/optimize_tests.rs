//! Code Optimization Tests

use std::io::Write;
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;
use test_case::test_case;
use voice_studio::optimize::{
    analyze_ast, optimize_code, Completion, CompletionChoice, CompletionClient, CompletionRequest,
};
use voice_studio::{Result, StudioError};

struct EchoClient;

impl CompletionClient for EchoClient {
    fn model(&self) -> &str {
        "echo"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        Ok(Completion {
            choices: vec![CompletionChoice {
                text: format!("  {}  ", request.prompt.lines().last().unwrap_or_default()),
            }],
        })
    }
}

struct DownClient;

impl CompletionClient for DownClient {
    fn model(&self) -> &str {
        "down"
    }

    fn complete(&self, _request: &CompletionRequest) -> Result<Completion> {
        Err(StudioError::CompletionApi {
            status: 503,
            body: "overloaded".into(),
        })
    }
}

#[test]
fn test_suggestion_is_trimmed_first_choice() {
    let suggestion = optimize_code(&EchoClient, "total = sum(xs)", "python").unwrap();
    assert_eq!(suggestion, "total = sum(xs)");
}

#[test]
fn test_endpoint_errors_propagate() {
    let err = optimize_code(&DownClient, "x", "python").unwrap_err();
    assert_eq!(err.error_code(), "COMPLETION_API_ERROR");
    assert!(err.to_string().contains("503"));
}

#[test_case("javascript", "function f( ) {  \n\n\n return 1 } // c\n")]
#[test_case("rust", "fn main(){}")]
#[test_case("", "def broken(:")]
#[test_case("pythonic", "x=1   # not python\n")]
#[test_case("Python", "x = 1   # capitalised\n")]
fn test_non_python_is_unchanged(language: &str, code: &str) {
    assert_eq!(analyze_ast(code, language).unwrap(), code);
}

#[test]
fn test_python_round_trip() {
    let code = "import math  # constants\n\n\n\nclass C:\n    \"\"\"Doc.\"\"\"\n\n    def area(self, r):\n        return math.pi * r ** 2   \n";
    let expected = "import math\n\nclass C:\n    \"\"\"Doc.\"\"\"\n\n    def area(self, r):\n        return math.pi * r ** 2\n";
    assert_eq!(analyze_ast(code, "python").unwrap(), expected);
}

#[test]
fn test_optimize_code_binary_ast_only() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_optimize-code"))
        .args(["--language", "python", "--ast-only"])
        .env_remove("OPENAI_API_KEY")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"# note\nvalue = 42   \n")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "value = 42\n");
}

#[test]
fn test_optimize_code_binary_requires_key() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("snippet.py");
    std::fs::write(&file, "x = 1\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_optimize-code"))
        .args(["--language", "python", "--file"])
        .arg(&file)
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
}
