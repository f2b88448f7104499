//! Document resolution for agreement uploads
//!
//! Locations are either plain filesystem paths or `embedded:<name>` entries
//! addressing documents bundled into the binary. Embedded documents are
//! materialized into a temp file before upload; the `TempPath` guard inside
//! `ResolvedDocument` deletes that copy exactly once when the value drops,
//! on every pipeline exit path. Deletion failures never surface.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::errors::SignError;

const EMBEDDED_SCHEME: &str = "embedded:";
const TEMP_FILE_PREFIX: &str = "signbridge-";

/// Documents compiled into the binary, addressable as `embedded:<name>`
static EMBEDDED_DOCUMENTS: &[(&str, &[u8])] = &[(
    "sample-agreement.docx",
    include_bytes!("../assets/sample-agreement.docx"),
)];

/// A file handle backing the document to upload
#[derive(Debug)]
pub struct ResolvedDocument {
    path: PathBuf,
    filename: String,
    /// Deletion guard, present only for materialized embedded documents
    temp: Option<TempPath>,
}

impl ResolvedDocument {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Resolve a document location to an uploadable file.
///
/// # Errors
///
/// Fails with `SignError::Client` when no location is configured, the
/// location cannot be found, or an embedded document cannot be materialized.
pub fn resolve_document(location: &str) -> Result<ResolvedDocument, SignError> {
    if location.trim().is_empty() {
        return Err(SignError::client(
            "No document path configured for Adobe Sign test runs.",
        ));
    }

    if let Some(name) = location.strip_prefix(EMBEDDED_SCHEME) {
        return materialize_embedded(name);
    }

    let path = PathBuf::from(location);
    if !path.is_file() {
        return Err(SignError::client(format!(
            "The document resource '{location}' could not be found."
        )));
    }
    let filename = path
        .file_name()
        .map_or_else(|| location.to_string(), |n| n.to_string_lossy().into_owned());
    Ok(ResolvedDocument {
        path,
        filename,
        temp: None,
    })
}

fn materialize_embedded(name: &str) -> Result<ResolvedDocument, SignError> {
    let bytes = EMBEDDED_DOCUMENTS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, bytes)| *bytes)
        .ok_or_else(|| {
            SignError::client(format!(
                "The document resource 'embedded:{name}' could not be found."
            ))
        })?;

    let mut file = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(&determine_suffix(name))
        .tempfile()
        .map_err(|e| SignError::client_caused("Failed to create a temporary document copy", e))?;
    file.write_all(bytes)
        .map_err(|e| SignError::client_caused("Failed to write the temporary document copy", e))?;

    let temp_path = file.into_temp_path();
    log::debug!("Materialized embedded document '{name}' at {}", temp_path.display());
    Ok(ResolvedDocument {
        path: temp_path.to_path_buf(),
        filename: name.to_string(),
        temp: Some(temp_path),
    })
}

fn determine_suffix(filename: &str) -> String {
    match filename.rfind('.') {
        Some(index) if index + 1 < filename.len() => filename[index..].to_string(),
        _ => ".tmp".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_document_is_materialized_and_deleted_on_drop() {
        let document = resolve_document("embedded:sample-agreement.docx").unwrap();
        assert!(document.is_temporary());
        assert_eq!(document.filename(), "sample-agreement.docx");
        assert!(document.path().exists());
        assert_eq!(
            document.path().extension().and_then(|e| e.to_str()),
            Some("docx")
        );

        let path = document.path().to_path_buf();
        drop(document);
        assert!(!path.exists());
    }

    #[test]
    fn local_file_is_not_temporary() {
        let file = tempfile::Builder::new()
            .suffix(".docx")
            .tempfile()
            .unwrap();
        let location = file.path().to_string_lossy().into_owned();

        let document = resolve_document(&location).unwrap();
        assert!(!document.is_temporary());

        let path = document.path().to_path_buf();
        drop(document);
        // Non-temporary documents survive the pipeline.
        assert!(path.exists());
    }

    #[test]
    fn missing_locations_fail_as_client_errors() {
        let err = resolve_document("/no/such/file.docx").unwrap_err();
        assert!(matches!(err, SignError::Client { .. }));

        let err = resolve_document("embedded:unknown.docx").unwrap_err();
        assert!(matches!(err, SignError::Client { .. }));

        let err = resolve_document("   ").unwrap_err();
        assert!(matches!(err, SignError::Client { .. }));
    }

    #[test]
    fn suffix_falls_back_to_tmp() {
        assert_eq!(determine_suffix("report.docx"), ".docx");
        assert_eq!(determine_suffix("no-extension"), ".tmp");
        assert_eq!(determine_suffix("trailing-dot."), ".tmp");
    }
}
