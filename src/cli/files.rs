use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::codec::Format;

/// Find files in `dir` that can be converted to `target`.
///
/// With `source` set only files of that format are returned; otherwise any
/// file whose extension names a format convertible to `target`. Results are
/// sorted so directory runs are deterministic.
pub fn find_source_files(
    dir: &Path,
    recursive: bool,
    source: Option<Format>,
    target: Format,
) -> Result<Vec<PathBuf>, walkdir::Error> {
    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(format) = super::format_of(entry.path()) else {
            continue;
        };
        let wanted = match source {
            Some(source) => format == source,
            None => format.can_convert_to(target),
        };
        if wanted {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
