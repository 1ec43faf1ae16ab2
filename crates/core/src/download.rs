//! Downloads of installer scripts and tool archives

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info};

pub trait ArchiveFetcher: Send + Sync {
    /// Downloads `url` into the file `dest`, replacing it.
    fn download_file(&self, url: &str, dest: &Path) -> Result<()>;

    /// Downloads a zip or `.tar.gz` archive and unpacks it into `dest_dir`.
    fn fetch_and_extract(&self, url: &str, dest_dir: &Path) -> Result<()>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpArchiveFetcher;

impl HttpArchiveFetcher {
    pub fn new() -> Self {
        Self
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let shown = redact_url(url);
        info!(url = %shown, "Downloading");

        let response = reqwest::blocking::get(url).with_context(|| {
            format!(
                "Failed to download {} (check network connectivity)",
                shown
            )
        })?;

        if !response.status().is_success() {
            bail!("Download failed with HTTP {} from {}", response.status(), shown);
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read response body from {}", shown))?;

        if bytes.is_empty() {
            bail!("Downloaded file is empty (HTTP 200 but 0 bytes) from {}", shown);
        }

        debug!(bytes = bytes.len(), "Download complete");
        Ok(bytes.to_vec())
    }
}

impl ArchiveFetcher for HttpArchiveFetcher {
    fn download_file(&self, url: &str, dest: &Path) -> Result<()> {
        let bytes = self.fetch(url)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(dest, bytes).with_context(|| format!("Failed to write {}", dest.display()))
    }

    fn fetch_and_extract(&self, url: &str, dest_dir: &Path) -> Result<()> {
        let bytes = self.fetch(url)?;
        extract_archive(&bytes, dest_dir)
    }
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const EMPTY_ZIP_MAGIC: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Unpacks a zip or gzip-compressed tar archive into `dest_dir`, chosen by its leading bytes.
pub fn extract_archive(data: &[u8], dest_dir: &Path) -> Result<()> {
    if data.starts_with(ZIP_MAGIC) || data.starts_with(EMPTY_ZIP_MAGIC) {
        extract_zip(data, dest_dir)
    } else if data.starts_with(GZIP_MAGIC) {
        extract_tar_gz(data, dest_dir)
    } else {
        bail!("Unrecognized archive format (expected zip or gzip-compressed tar)");
    }
}

fn extract_zip(data: &[u8], dest_dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).context("Invalid zip archive")?;
    debug!(entries = archive.len(), "Extracting zip archive");

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory {}", dest_dir.display()))?;

    archive
        .extract(dest_dir)
        .with_context(|| format!("Failed to extract archive into {}", dest_dir.display()))
}

fn extract_tar_gz(data: &[u8], dest_dir: &Path) -> Result<()> {
    let mut decoder = GzDecoder::new(data);
    let mut tar_data = Vec::new();
    decoder
        .read_to_end(&mut tar_data)
        .context("Failed to decompress archive (invalid gzip format)")?;

    if tar_data.is_empty() {
        bail!("Archive decompressed to empty data");
    }

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory {}", dest_dir.display()))?;

    tar::Archive::new(&tar_data[..])
        .unpack(dest_dir)
        .with_context(|| format!("Failed to extract archive into {}", dest_dir.display()))
}

/// Drops the query string, which may carry a shared-access signature.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?<redacted>", base),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in files {
            writer.start_file(*path, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_archive() {
        let temp = TempDir::new().unwrap();
        let data = tar_gz(&[
            ("Microsoft.ManifestTool.dll", "dll"),
            ("runtimes/linux-x64/native.so", "so"),
        ]);

        extract_archive(&data, &temp.path().join("SBOMUtil")).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("SBOMUtil/Microsoft.ManifestTool.dll")).unwrap(),
            "dll"
        );
        assert!(temp
            .path()
            .join("SBOMUtil/runtimes/linux-x64/native.so")
            .is_file());
    }

    #[test]
    fn test_extract_zip_archive() {
        let temp = TempDir::new().unwrap();
        let data = zip_bytes(&[
            ("Microsoft.ManifestTool.dll", "dll"),
            ("Microsoft.ManifestTool.runtimeconfig.json", "{}"),
            ("runtimes/win-x64/native.dll", "native"),
        ]);

        extract_archive(&data, &temp.path().join("SBOMUtil")).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("SBOMUtil/Microsoft.ManifestTool.dll")).unwrap(),
            "dll"
        );
        assert!(temp
            .path()
            .join("SBOMUtil/runtimes/win-x64/native.dll")
            .is_file());
    }

    #[test]
    fn test_extract_rejects_corrupt_zip() {
        let temp = TempDir::new().unwrap();
        let result = extract_archive(b"PK\x03\x04 truncated", &temp.path().join("out"));
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_rejects_unknown_format() {
        let temp = TempDir::new().unwrap();
        let err = extract_archive(b"<html>Not Found</html>", temp.path()).unwrap_err();
        assert!(err.to_string().contains("Unrecognized archive format"));
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://store.blob.core.windows.net/tools/sbom.tar.gz?sv=2021&sig=abc"),
            "https://store.blob.core.windows.net/tools/sbom.tar.gz?<redacted>"
        );
        assert_eq!(
            redact_url("https://dot.net/v1/dotnet-install.sh"),
            "https://dot.net/v1/dotnet-install.sh"
        );
    }
}
