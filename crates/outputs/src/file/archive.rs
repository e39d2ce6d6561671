//! Zip packing of a group directory

use std::fs::{self, File};
use std::io;
use std::path::Path;

use gde_core::{PluginError, Result};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Pack `source` into a new archive at `target`
///
/// Entry names are rooted at the directory's own name, so extracting
/// `Org@time.zip` recreates `Org@time/...`. Files are deflated;
/// directories get their own entries. Returns the number of files packed.
///
/// Blocking; run it on the blocking pool.
pub fn zip_dir(source: &Path, target: &Path) -> Result<usize> {
    let root = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PluginError::write(format!("cannot archive {}", source.display())))?
        .to_string();

    let file = File::create(target)?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let files = add_dir(&mut zip, source, &root, options)?;

    zip.finish().map_err(PluginError::write)?;
    Ok(files)
}

fn add_dir(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> Result<usize> {
    zip.add_directory(format!("{}/", prefix), options)
        .map_err(PluginError::write)?;

    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut files = 0;
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        let name = format!("{}/{}", prefix, name);

        if entry.file_type()?.is_dir() {
            files += add_dir(zip, &path, &name, options)?;
        } else {
            zip.start_file(name, options).map_err(PluginError::write)?;
            io::copy(&mut File::open(&path)?, zip)?;
            files += 1;
        }
    }
    Ok(files)
}
