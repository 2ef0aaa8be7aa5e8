//! Source extraction from Visual Studio project files.
//!
//! Engine projects keep their source lists in `.vcproj` documents; the Unix
//! build reuses those documents instead of maintaining a parallel file list.
//! [`extract_sources`] walks every `File` element in document order,
//! normalizes the Windows-style path, applies the exclusion proxy, and keeps
//! the compilable entries (`.c` / `.cpp`).
//!
//! The walk is deliberately forgiving: only a document that fails to parse as
//! XML is an error. Entries with no path attribute collapse to the empty
//! string and fall out at the suffix filter rather than being rejected - a
//! latent defect kept for compatibility with the project files in the wild.

use std::path::{Path, PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Ordered list of extracted source paths. Document order, duplicates kept.
pub type SourceList = Vec<String>;

/// Exclusion proxy configuration.
///
/// Project files carry no per-platform exclusion data, so the Win32 release
/// flag marks files excluded from every build, Windows or not. Renaming this
/// would silently re-include files; a platform-specific configuration can be
/// introduced if a file ever needs to be excluded on one side only.
const EXCLUSION_CONFIGURATION: &str = "release|win32";

/// Error reading or parsing a project file.
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectFileError {
    #[error("failed to read project file `{path}`")]
    #[diagnostic(code(slipway::project::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Malformed(#[from] Box<MalformedProjectError>),
}

/// The document is not well-formed XML.
#[derive(Debug, Error, Diagnostic)]
#[error("malformed project file: {message}")]
#[diagnostic(
    code(slipway::project::malformed),
    help("the project file must be well-formed XML")
)]
pub struct MalformedProjectError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("{message}")]
    pub span: SourceSpan,
}

/// Extract the compilable source paths from a project file.
///
/// Reads the file and applies [`extract_sources_str`] to its contents.
pub fn extract_sources(path: &Path) -> Result<SourceList, ProjectFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ProjectFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_from_doc(&path.display().to_string(), &text)
}

/// Extract the compilable source paths from an in-memory project document.
pub fn extract_sources_str(text: &str) -> Result<SourceList, ProjectFileError> {
    extract_from_doc("<project>", text)
}

fn extract_from_doc(name: &str, text: &str) -> Result<SourceList, ProjectFileError> {
    let doc = roxmltree::Document::parse(text).map_err(|e| {
        Box::new(MalformedProjectError {
            message: e.to_string(),
            src: NamedSource::new(name, text.to_string()),
            span: error_span(text, &e),
        })
    })?;

    let mut sources = Vec::new();
    // descendants() yields nodes in document order, which fixes the output
    // order; File elements nested under filter groups are picked up too.
    for file in doc.descendants().filter(|n| n.has_tag_name("File")) {
        let raw = file.attribute("RelativePath").unwrap_or("");
        let normalized = raw.replace('\\', "/");
        let path = match normalized.strip_prefix("./") {
            Some(rest) => rest.to_string(),
            None => normalized,
        };

        let excluded = file
            .descendants()
            .filter(|n| n.has_tag_name("FileConfiguration"))
            .any(|fc| {
                fc.attribute("ExcludedFromBuild")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true"))
                    && fc
                        .attribute("Name")
                        .is_some_and(|v| v.eq_ignore_ascii_case(EXCLUSION_CONFIGURATION))
            });

        let lower = path.to_lowercase();
        if !excluded && (lower.ends_with(".cpp") || lower.ends_with(".c")) {
            sources.push(path);
        }
    }

    Ok(sources)
}

/// Prefix every whitespace-separated name in `names` with `prefix` + `/`.
///
/// Build scripts list their sources as indented string blocks; this turns one
/// of those blocks into full paths.
pub fn build_list(prefix: &str, names: &str) -> Vec<String> {
    names
        .split_whitespace()
        .map(|name| format!("{}/{}", prefix, name))
        .collect()
}

/// Convert the parser's row/column position into a span over `text`.
fn error_span(text: &str, err: &roxmltree::Error) -> SourceSpan {
    let pos = err.pos();
    let mut offset = 0usize;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if idx + 1 == pos.row as usize {
            let col = (pos.col as usize).saturating_sub(1);
            offset += col.min(line.len());
            break;
        }
        offset += line.len();
    }
    let offset = offset.min(text.len());
    let len = if offset < text.len() { 1 } else { 0 };
    SourceSpan::new(offset.into(), len)
}
