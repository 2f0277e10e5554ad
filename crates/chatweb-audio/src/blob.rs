// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::Path;

pub const WEBM_MIME: &str = "audio/webm";
pub const WEBM_FILE_NAME: &str = "audio.webm";

/// One finished recording, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
}

impl AudioBlob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self { bytes, mime: mime.into(), file_name: file_name.into() }
    }

    /// A WebM recording named `audio.webm`.
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self::new(bytes, WEBM_MIME, WEBM_FILE_NAME)
    }

    /// Join buffered chunks in capture order.
    pub fn from_chunks(
        chunks: Vec<Vec<u8>>,
        mime: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self::new(chunks.concat(), mime, file_name)
    }

    /// Read an existing recording from disk.  The upload carries `mime` and
    /// `file_name`, not the local file name.
    pub fn read_file(
        path: &Path,
        mime: impl Into<String>,
        file_name: impl Into<String>,
    ) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?, mime, file_name))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_joined_in_order() {
        let blob = AudioBlob::from_chunks(vec![vec![1, 2], vec![], vec![3]], WEBM_MIME, WEBM_FILE_NAME);
        assert_eq!(blob.bytes, vec![1, 2, 3]);
        assert_eq!(blob.len(), 3);
    }

    #[test]
    fn read_file_uses_upload_name_not_local_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gravacao-01.ogg");
        std::fs::write(&path, b"abc").unwrap();
        let blob = AudioBlob::read_file(&path, WEBM_MIME, WEBM_FILE_NAME).unwrap();
        assert_eq!(blob.file_name, "audio.webm");
        assert_eq!(blob.mime, "audio/webm");
        assert_eq!(blob.bytes, b"abc");
    }

    #[test]
    fn read_file_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = AudioBlob::read_file(&dir.path().join("nada.webm"), WEBM_MIME, WEBM_FILE_NAME)
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
