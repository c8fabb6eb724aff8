//! Find-and-replace on a single file.
//!
//! The file is rewritten through a temporary file in the same directory that
//! is then renamed over the original, so a crash never leaves a half-written
//! file behind. A pattern that does not occur leaves the file untouched.

use crate::error::ToolError;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What to replace, and where.
#[derive(Debug, Clone)]
pub struct PatchRequest {
    /// File to patch
    pub file: PathBuf,
    /// Text (or regular expression) to look for
    pub pattern: String,
    /// Replacement text; `$1`-style references expand in regex mode
    pub replacement: String,
    /// Treat `pattern` as a regular expression
    pub regex: bool,
    /// Count matches without writing
    pub dry_run: bool,
}

/// Result of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Number of occurrences replaced (or that would be, in a dry run)
    pub replacements: usize,
    /// Whether the file was rewritten
    pub written: bool,
}

/// Replaces every occurrence of `pattern` in `content`.
///
/// Returns the new content and the number of replacements.
///
/// # Errors
/// Returns `InvalidArgument` for an empty pattern or an invalid regex.
pub fn substitute(
    content: &str,
    pattern: &str,
    replacement: &str,
    regex: bool,
) -> Result<(String, usize), ToolError> {
    if pattern.is_empty() {
        return Err(ToolError::invalid("pattern must not be empty"));
    }

    if regex {
        let re = Regex::new(pattern)
            .map_err(|e| ToolError::invalid(format!("invalid regular expression: {e}")))?;
        let count = re.find_iter(content).count();
        Ok((re.replace_all(content, replacement).into_owned(), count))
    } else {
        let count = content.matches(pattern).count();
        Ok((content.replace(pattern, replacement), count))
    }
}

/// Applies `request` to its file.
///
/// # Errors
/// - `InvalidArgument` for an empty pattern or invalid regex
/// - `PatternNotFound` when nothing matches
/// - `Io` when the file cannot be read or replaced
pub fn apply(request: &PatchRequest) -> Result<PatchOutcome, ToolError> {
    let path = &request.file;
    let content = std::fs::read_to_string(path)
        .map_err(|e| ToolError::io(format!("Failed to read {}", path.display()), e))?;

    let (patched, replacements) = substitute(
        &content,
        &request.pattern,
        &request.replacement,
        request.regex,
    )?;

    if replacements == 0 {
        return Err(ToolError::PatternNotFound { path: path.clone() });
    }

    if request.dry_run {
        tracing::info!("Dry run: {} replacement(s) in {}", replacements, path.display());
        return Ok(PatchOutcome {
            replacements,
            written: false,
        });
    }

    write_atomically(path, &patched)?;
    tracing::info!("Patched {} ({} replacement(s))", path.display(), replacements);
    Ok(PatchOutcome {
        replacements,
        written: true,
    })
}

fn write_atomically(path: &Path, content: &str) -> Result<(), ToolError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let context = || format!("Failed to write {}", path.display());

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ToolError::io(context(), e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| ToolError::io(context(), e))?;

    if let Ok(metadata) = std::fs::metadata(path)
        && let Err(e) = tmp.as_file().set_permissions(metadata.permissions())
    {
        tracing::debug!("Could not copy permissions of {}: {}", path.display(), e);
    }

    tmp.persist(path)
        .map_err(|e| ToolError::io(context(), e.error))?;
    Ok(())
}
