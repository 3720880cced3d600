// discovery.rs - Locate estimator output files by filename suffix

use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

/// An estimator output file and the locus it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub locus_id: String,
    pub path: PathBuf,
}

impl InputFile {
    /// Read the whole file; invalid UTF-8 is replaced rather than rejected.
    pub fn read(&self) -> Result<String> {
        let bytes = std::fs::read(&self.path).map_err(|e| Error::io(&self.path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Strip `extension` from a file name, if the name ends with it.
pub fn locus_id_for(file_name: &str, extension: &str) -> Option<String> {
    file_name
        .strip_suffix(extension)
        .filter(|stem| !stem.is_empty())
        .map(|stem| stem.to_string())
}

/// List every regular file in `dir` whose name ends with `extension`,
/// ordered by file name.
///
/// Zero matches is fatal.
pub fn discover_inputs(dir: &Path, extension: &str) -> Result<Vec<InputFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            log::warn!("⚠️  Skipping non UTF-8 file name: {}", path.display());
            continue;
        };
        if let Some(locus_id) = locus_id_for(file_name, extension) {
            inputs.push(InputFile { locus_id, path });
        }
    }

    if inputs.is_empty() {
        return Err(Error::NoInputFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    inputs.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    log::info!(
        "📂 Found {} files ending with '{}' in {}",
        inputs.len(),
        extension,
        dir.display()
    );
    Ok(inputs)
}
