use std::path::Path;

use strata_core::{ScanConfig, StrataError};
use tracing::debug;

/// Source files under `root.join(dir)`, as paths relative to `root`.
///
/// Directories named in `scan.skip_dirs` are never entered, and only files
/// whose extension appears in `scan.extensions` are returned. Ignore files
/// and hidden-file rules are not applied. Without `recursive` only the top
/// level of `dir` is listed. Results are sorted by path.
///
/// # Errors
///
/// Returns [`StrataError::FileNotFound`] if `dir` is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use strata_core::ScanConfig;
/// use strata_dig::walker::source_files;
///
/// let files = source_files(Path::new("."), Path::new("src"), true, &ScanConfig::default()).unwrap();
/// for f in &files {
///     println!("{f}");
/// }
/// ```
pub fn source_files(
    root: &Path,
    dir: &Path,
    recursive: bool,
    scan: &ScanConfig,
) -> Result<Vec<String>, StrataError> {
    let start = root.join(dir);
    if !start.is_dir() {
        return Err(StrataError::FileNotFound(dir.to_path_buf()));
    }

    let skip_dirs = scan.skip_dirs.clone();
    let mut builder = ignore::WalkBuilder::new(&start);
    builder
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !skip_dirs
                    .iter()
                    .any(|skip| entry.file_name() == skip.as_str())
        });
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !scan.extensions.iter().any(|known| known == ext) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        files.push(relative.to_string_lossy().into_owned());
    }

    files.sort();
    Ok(files)
}
