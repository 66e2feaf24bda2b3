//! Change-log replay helpers.
//!
//! A host records its session as JSON Lines, one [`ChangeEvent`] per line.
//! Blank lines and lines starting with `#` are skipped.

use ailint_core::ChangeEvent;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Reads a JSON Lines change log.
pub fn load_events(path: &Path) -> Result<Vec<ChangeEvent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event log: {:?}", path))?;
    parse_events(&raw).with_context(|| format!("Invalid event log: {:?}", path))
}

pub fn parse_events(raw: &str) -> Result<Vec<ChangeEvent>> {
    let mut events = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: ChangeEvent =
            serde_json::from_str(line).with_context(|| format!("line {}", i + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Editor language identifier for a file, from its extension.
pub fn language_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "rs" => "rust",
        "py" | "pyi" => "python",
        "ts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "sh" | "bash" => "shellscript",
        "md" => "markdown",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events_skips_blank_and_comments() {
        let raw = r#"
# recorded by the editor extension
{"document":"a.rs","timestamp_ms":10,"position":{"line":0,"character":0},"text":"f"}

{"document":"a.rs","timestamp_ms":20,"text":"n"}
"#;
        let events = parse_events(raw).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp_ms, 10);
        assert_eq!(events[1].text, "n");
        assert_eq!(events[1].position.line, 0);
    }

    #[test]
    fn test_parse_events_reports_line() {
        let raw = "{\"document\":\"a.rs\",\"timestamp_ms\":1}\nnot json\n";
        let err = parse_events(raw).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path(Path::new("src/main.rs")), "rust");
        assert_eq!(language_for_path(Path::new("tool.PY")), "python");
        assert_eq!(language_for_path(Path::new("app.tsx")), "typescriptreact");
        assert_eq!(language_for_path(Path::new("Makefile")), "plaintext");
    }
}
