use std::path::{Path, PathBuf};

use crate::codec::Format;

/// Map a source file under `input_dir` to its converted path under `output_dir`.
/// The directory structure relative to `input_dir` is preserved and the
/// extension replaced with the target format's.
pub fn map_input_to_output(
    input_dir: &Path,
    input_file: &Path,
    output_dir: &Path,
    target: Format,
) -> PathBuf {
    let relative = input_file.strip_prefix(input_dir).unwrap_or(input_file);
    let mut out = output_dir.join(relative);
    out.set_extension(target.extension());
    out
}
