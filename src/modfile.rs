//! Minimal `go.mod` parsing.
//!
//! Only `replace` directives matter to the pipeline: they redirect an import
//! path to another module (or a local directory), and the hashed output must be
//! keyed by the original import path while recording where the content actually
//! came from. Everything else in `go.mod` (module path, go version, requires)
//! is interpreted by the `go` tool itself during the download step.

use crate::error::GenerateError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Parse the replace directives of a `go.mod` file.
///
/// Returns a map keyed by the *replacement target's* module path, with the
/// replaced (original) import path as the value. That orientation matches the
/// download step, which reports modules under their replacement-target path.
/// Local-directory targets are recorded too; they are never consulted because
/// the download step does not emit filesystem-path modules.
pub fn parse_replace_directives(contents: &str) -> Result<HashMap<String, String>, GenerateError> {
    let mut replace = HashMap::new();
    let mut in_block = false;

    for (lineno, raw_line) in contents.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            let (new_path, old_path) = parse_replace_line(line, lineno + 1)?;
            replace.insert(new_path, old_path);
            continue;
        }

        if let Some(rest) = line.strip_prefix("replace") {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
                continue;
            }
            let (new_path, old_path) = parse_replace_line(rest, lineno + 1)?;
            replace.insert(new_path, old_path);
        }
    }

    if in_block {
        return Err(GenerateError::ModFile(
            "unterminated replace block".to_string(),
        ));
    }

    Ok(replace)
}

/// Read and parse the `go.mod` in `dir`.
pub fn load_replace_directives(dir: &Path) -> Result<HashMap<String, String>, GenerateError> {
    let mod_path = dir.join("go.mod");
    let contents = fs::read_to_string(&mod_path).map_err(|e| GenerateError::io(&mod_path, e))?;
    parse_replace_directives(&contents)
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse one `old [version] => new [version]` directive.
fn parse_replace_line(line: &str, lineno: usize) -> Result<(String, String), GenerateError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let arrow = tokens
        .iter()
        .position(|t| *t == "=>")
        .ok_or_else(|| GenerateError::ModFile(format!("line {lineno}: missing '=>'")))?;

    let old = &tokens[..arrow];
    let new = &tokens[arrow + 1..];
    if old.is_empty() || old.len() > 2 || new.is_empty() || new.len() > 2 {
        return Err(GenerateError::ModFile(format!(
            "line {lineno}: malformed replace directive"
        )));
    }

    Ok((new[0].to_string(), old[0].to_string()))
}
