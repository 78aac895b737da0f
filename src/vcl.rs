//! Generated VCL storage
//!
//! Persists rendered VCL to disk and records each file in an
//! [`ArtifactRegistry`] so the most recent one can be loaded later.

use crate::registry::ArtifactRegistry;
use crate::Result;
use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Writes VCL files into a directory
#[derive(Debug)]
pub struct VclWriter {
    dir: PathBuf,
    seq: u64,
}

impl VclWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` to a new file and register its path
    ///
    /// Names are unique within one writer. Registration order, not the file
    /// name, is what defines which file is the latest.
    pub fn write(&mut self, registry: &mut ArtifactRegistry, content: &str) -> Result<PathBuf> {
        // Registered identifiers are strings; a lossy one would not read back.
        let path = self.next_path();
        let identifier = path
            .to_str()
            .with_context(|| format!("VCL path is not valid UTF-8: {}", path.display()))?
            .to_owned();

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create VCL directory: {}", self.dir.display()))?;

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("Failed to create VCL file: {}", path.display()))?;
        write_or_remove(file, &path, content)?;

        info!("Wrote VCL file {} ({} bytes)", path.display(), content.len());
        registry.append(identifier);
        Ok(path)
    }

    /// Read back the most recently registered VCL file
    pub fn latest_content(registry: &ArtifactRegistry) -> Result<Option<String>> {
        let Some(latest) = registry.latest() else {
            debug!("No VCL file registered yet");
            return Ok(None);
        };

        let content = fs::read_to_string(latest)
            .with_context(|| format!("Failed to read VCL file: {}", latest))?;
        Ok(Some(content))
    }

    fn next_path(&mut self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.seq += 1;
        self.dir.join(format!("{}-{}.vcl", self.seq, millis))
    }
}

/// Write the whole of `content`, deleting `path` if that fails part-way.
fn write_or_remove<W: Write>(mut out: W, path: &Path, content: &str) -> Result<()> {
    let result = out.write_all(content.as_bytes()).and_then(|()| out.flush());
    drop(out);

    if let Err(e) = result {
        if let Err(remove_err) = fs::remove_file(path) {
            warn!("Failed to remove partial VCL file {}: {}", path.display(), remove_err);
        }
        return Err(e).with_context(|| format!("Failed to write VCL file: {}", path.display()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_registers_path() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = VclWriter::new(temp_dir.path());
        let mut registry = ArtifactRegistry::new();

        let path = writer.write(&mut registry, "vcl 4.0;").unwrap();

        assert!(path.starts_with(temp_dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("vcl"));
        assert_eq!(registry.latest(), Some(path.to_str().unwrap()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "vcl 4.0;");
    }

    #[test]
    fn test_latest_content_follows_last_write() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = VclWriter::new(temp_dir.path().join("nested"));
        let mut registry = ArtifactRegistry::new();

        assert_eq!(VclWriter::latest_content(&registry).unwrap(), None);

        let first = writer.write(&mut registry, "backend a {}").unwrap();
        let second = writer.write(&mut registry, "backend b {}").unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            VclWriter::latest_content(&registry).unwrap().as_deref(),
            Some("backend b {}")
        );
    }

    #[test]
    fn test_names_stay_unique_past_many_writes() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = VclWriter::new(temp_dir.path());
        writer.seq = 9_998;
        let mut registry = ArtifactRegistry::new();

        let paths: Vec<PathBuf> = (0..4)
            .map(|i| writer.write(&mut registry, &format!("# {}", i)).unwrap())
            .collect();

        let names: std::collections::HashSet<_> = paths.iter().map(|p| p.file_name()).collect();
        assert_eq!(names.len(), 4);
        assert_eq!(registry.latest(), paths[3].to_str());
        assert_eq!(VclWriter::latest_content(&registry).unwrap().as_deref(), Some("# 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_dir_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(OsStr::from_bytes(b"vcl-\xff"));
        let mut writer = VclWriter::new(&dir);
        let mut registry = ArtifactRegistry::new();

        let err = writer.write(&mut registry, "vcl 4.1;").unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"));
        assert!(registry.is_empty());
        assert!(!dir.exists());
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.vcl");
        fs::write(&path, "half").unwrap();

        assert!(write_or_remove(FailingWriter, &path, "backend a {}").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_latest_content_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = ArtifactRegistry::new();
        registry.append(temp_dir.path().join("gone.vcl").to_string_lossy().into_owned());

        assert!(VclWriter::latest_content(&registry).is_err());
    }
}
