//! Import boundary between restricted (server-only) modules and the rest.
//!
//! A restricted module may import anything, but may itself only be
//! imported by another restricted module. The check runs on every
//! resolution, including transitive ones, and keeps no state.

use crate::config::Conventions;
use crate::error::{Error, Result};
use crate::host::ResolveFilename;
use std::path::Path;
use std::sync::Arc;

/// Importer label used when a restricted module is loaded as an entry point.
pub const ENTRY_IMPORTER: &str = "<entry>";

/// Check one resolution of `request` to `resolved`, imported by `importer`.
pub fn check_import(
    conventions: &Conventions,
    request: &str,
    resolved: &Path,
    importer: Option<&Path>,
) -> Result<()> {
    let resolved_str = resolved.to_string_lossy();
    if !conventions.is_restricted(&resolved_str) {
        return Ok(());
    }

    if let Some(importer) = importer {
        if conventions.is_restricted(&importer.to_string_lossy()) {
            return Ok(());
        }
    }

    let importer = importer.map_or_else(
        || ENTRY_IMPORTER.to_string(),
        |p| p.display().to_string(),
    );
    let expanded = (request != resolved_str).then(|| resolved.to_path_buf());
    tracing::debug!(%importer, request, resolved = %resolved_str, "rejected restricted import");
    Err(Error::boundary_violation(importer, request, expanded))
}

/// Wrap a filename resolver so that every resolution is checked.
#[must_use]
pub fn guard(conventions: Arc<Conventions>, inner: ResolveFilename) -> ResolveFilename {
    Box::new(move |request, parent, is_main| {
        let resolved = inner(request, parent, is_main)?;
        check_import(
            &conventions,
            request,
            &resolved,
            parent.map(|p| p.filename.as_path()),
        )?;
        Ok(resolved)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn conventions() -> Conventions {
        Conventions::default()
    }

    #[test]
    fn test_restricted_from_unrestricted_fails() {
        let c = conventions();
        for importer in ["/app/page.js", "/app/Button.client.js", "/app/server.js"] {
            let err = check_import(
                &c,
                "./db.server.js",
                Path::new("/app/db.server.js"),
                Some(Path::new(importer)),
            )
            .unwrap_err();
            match err {
                Error::BoundaryViolation {
                    importer: got,
                    specifier,
                    resolved,
                    ..
                } => {
                    assert_eq!(got, importer);
                    assert_eq!(specifier, "./db.server.js");
                    assert_eq!(resolved, Some(PathBuf::from("/app/db.server.js")));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_restricted_from_restricted_succeeds() {
        let c = conventions();
        for target in ["/app/db.server.js", "/app/api.server.ts"] {
            check_import(&c, "./x", Path::new(target), Some(Path::new("/app/root.server.js")))
                .unwrap();
        }
    }

    #[test]
    fn test_entry_point_cannot_be_restricted() {
        let err = check_import(&conventions(), "./db.server.js", Path::new("/app/db.server.js"), None)
            .unwrap_err();
        assert!(err.to_string().contains(ENTRY_IMPORTER));
    }

    #[test]
    fn test_unrestricted_targets_pass() {
        let c = conventions();
        check_import(&c, "./a", Path::new("/app/a.js"), Some(Path::new("/app/b.js"))).unwrap();
        check_import(&c, "./a", Path::new("/app/a.client.js"), None).unwrap();
    }

    #[test]
    fn test_identical_specifier_omits_expansion() {
        let err = check_import(
            &conventions(),
            "/app/db.server.js",
            Path::new("/app/db.server.js"),
            Some(Path::new("/app/page.js")),
        )
        .unwrap_err();
        assert!(matches!(err, Error::BoundaryViolation { resolved: None, .. }));
        assert!(!err.to_string().contains("expands"));
    }
}
