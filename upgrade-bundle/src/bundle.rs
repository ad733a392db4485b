//! Bundle container: JSON manifest, a NUL byte, then the raw payloads

#[cfg(unix)]
use std::fs::Permissions;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{BundleError, Result};
use crate::manifest::Manifest;

/// Byte separating the manifest from the first payload
pub const MANIFEST_TERMINATOR: u8 = 0;

/// A fully validated bundle, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    manifest: Manifest,
    payloads: Vec<Vec<u8>>,
}

impl Bundle {
    pub(crate) fn new(manifest: Manifest, payloads: Vec<Vec<u8>>) -> Self {
        Self { manifest, payloads }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Payloads in the same order as `manifest().partitions`
    pub fn payloads(&self) -> &[Vec<u8>] {
        &self.payloads
    }

    /// Encode the whole container in memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = self.manifest.to_json()?;
        out.reserve(1 + self.manifest.payload_size() as usize);
        out.push(MANIFEST_TERMINATOR);
        for payload in &self.payloads {
            out.extend_from_slice(payload);
        }
        Ok(out)
    }

    /// Stream the container to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.manifest.write_json(&mut *writer)?;
        writer.write_all(&[MANIFEST_TERMINATOR])?;
        for payload in &self.payloads {
            writer.write_all(payload)?;
        }
        writer.flush()
    }

    /// Write the bundle to `path`.
    ///
    /// A regular file (new or existing) is replaced atomically: the data goes
    /// to a temporary file next to it first and is renamed over it only once
    /// fully written, so `path` never holds a partial bundle. A symlink is
    /// resolved and its target replaced the same way. Anything else that
    /// already exists there (a device node, a FIFO) is written through
    /// directly.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let target = match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                fs::canonicalize(path).map_err(|e| BundleError::io(path, e))?
            }
            _ => path.to_path_buf(),
        };

        match fs::metadata(&target) {
            Ok(meta) if !meta.is_file() => self.write_through(&target)?,
            _ => self.replace_file(&target)?,
        }

        info!("bundle written to {}", path.display());
        Ok(())
    }

    fn write_through(&self, path: &Path) -> Result<()> {
        debug!("writing directly to {}", path.display());
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| BundleError::io(path, e))?;
        self.write_to(&mut BufWriter::new(file))
            .map_err(|e| BundleError::io(path, e))
    }

    fn replace_file(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut staging = tempfile::Builder::new();
        staging.prefix(".upgrade-bundle");
        // tempfile defaults to 0600
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staging.permissions(Permissions::from_mode(0o644));
        }
        let mut tmp = staging
            .tempfile_in(dir)
            .map_err(|e| BundleError::io(path, e))?;

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.write_to(&mut writer)
                .map_err(|e| BundleError::io(path, e))?;
        }

        tmp.persist(path)
            .map_err(|e| BundleError::io(path, e.error))?;
        Ok(())
    }

    /// Size of the encoded container in bytes
    pub fn total_size(&self) -> Result<u64> {
        let manifest_len = self.manifest.to_json()?.len() as u64;
        Ok(manifest_len + 1 + self.manifest.payload_size())
    }
}
