//! Workspace file parser with helpful error messages

use std::path::Path;

use super::{WorkspaceDefinition, WorkspaceError};

/// Parse and validate a workspace file.
///
/// A missing file is reported as [`WorkspaceError::NotFound`] so callers can
/// abort before anything is dispatched.
pub fn parse_workspace_file(path: &Path) -> Result<WorkspaceDefinition, WorkspaceError> {
    if !path.exists() {
        return Err(WorkspaceError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| WorkspaceError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_workspace_str(&content).map_err(|e| match e {
        WorkspaceError::Parse(msg) => {
            WorkspaceError::Parse(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Parse and validate workspace content from a string.
pub fn parse_workspace_str(content: &str) -> Result<WorkspaceDefinition, WorkspaceError> {
    let workspace: WorkspaceDefinition =
        toml::from_str(content).map_err(|e| enhance_toml_error(&e, content))?;

    workspace.validate()?;
    Ok(workspace)
}

fn enhance_toml_error(error: &toml::de::Error, content: &str) -> WorkspaceError {
    let message = error.message().to_string();

    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())]
                .matches('\n')
                .count()
                + 1;
            WorkspaceError::Parse(format!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                get_line_context(content, line_num),
                message
            ))
        }
        None => WorkspaceError::Parse(format!("TOML parsing error: {}", message)),
    }
}

fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
