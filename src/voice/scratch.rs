use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::SpeechError;

const PREFIX: &str = "sprachtrainer-";
const SUFFIX: &str = ".mp3";

/// Write `audio` to a new, uniquely named `.mp3` file under `dir`.
///
/// The file outlives this call; whoever receives the path deletes it.
pub async fn write_scratch(dir: &Path, audio: &[u8]) -> Result<PathBuf, SpeechError> {
    let path = tempfile::Builder::new()
        .prefix(PREFIX)
        .suffix(SUFFIX)
        .tempfile_in(dir)
        .and_then(|file| file.into_temp_path().keep().map_err(|e| e.error))
        .map_err(|source| SpeechError::FileIo {
            path: dir.to_path_buf(),
            source,
        })?;

    if let Err(source) = fs::write(&path, audio).await {
        discard_partial(&path).await;
        return Err(SpeechError::FileIo { path, source });
    }

    tracing::debug!(path = %path.display(), bytes = audio.len(), "Scratch audio written");
    Ok(path)
}

/// Remove a scratch file whose write failed. Failures are logged.
async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial scratch audio");
        }
    }
}

/// Delete a scratch file. A file that is already gone is not an error.
pub fn remove_scratch(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Scratch audio removed");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scratch_files_are_unique_mp3s() {
        let dir = tempfile::tempdir().unwrap();

        let first = write_scratch(dir.path(), b"first").await.unwrap();
        let second = write_scratch(dir.path(), b"second").await.unwrap();

        assert_ne!(first, second);
        for path in [&first, &second] {
            let name = path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with(PREFIX) && name.ends_with(SUFFIX), "{name}");
            assert_eq!(path.parent(), Some(dir.path()));
        }
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[tokio::test]
    async fn missing_directory_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = write_scratch(&missing, b"audio").await.unwrap_err();
        assert!(matches!(err, SpeechError::FileIo { .. }));
    }

    #[tokio::test]
    async fn partial_files_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprachtrainer-partial.mp3");
        std::fs::write(&path, b"half").unwrap();

        discard_partial(&path).await;
        assert!(!path.exists());
        discard_partial(&path).await;
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scratch(dir.path(), b"audio").await.unwrap();

        remove_scratch(&path).unwrap();
        assert!(!path.exists());
        remove_scratch(&path).unwrap();
    }
}
