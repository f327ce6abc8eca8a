//! Chunk discovery, ordering and merge.
//!
//! Uploaded parts live next to each other in the task directory as
//! `*.chunk` files. Each name embeds a sequence number (`chunk_1.chunk`,
//! `part-0042.chunk`, ...) which fixes the order they are concatenated in.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Extension identifying an uploaded part.
pub const CHUNK_EXTENSION: &str = "chunk";

/// Sequence assigned to a chunk whose name carries no digits. Sorts first.
pub const NO_SEQUENCE: i64 = -1;

fn digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII only: `\d` would also match other Unicode decimal digits.
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"))
}

/// Extract the sequence number embedded in a chunk file name.
///
/// Only the base name is inspected. The first maximal run of decimal digits
/// is parsed; a name without digits, or a run too large for `i64`, yields
/// [`NO_SEQUENCE`].
pub fn extract_sequence_number(file_name: impl AsRef<Path>) -> i64 {
    let path = file_name.as_ref();
    let base = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return NO_SEQUENCE,
    };

    digits_pattern()
        .find(&base)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(NO_SEQUENCE)
}

/// One uploaded part of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub path: PathBuf,
    pub sequence: i64,
}

impl Chunk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sequence = extract_sequence_number(&path);
        Self { path, sequence }
    }
}

/// Result of a successful merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    /// Number of chunks appended
    pub chunks: usize,
    /// Bytes written to the merged file
    pub bytes: u64,
}

/// Whether the file name ends in `.chunk`.
///
/// A bare `.chunk` counts too: it has no extension as far as
/// [`Path::extension`] is concerned, yet it is still an uploaded part.
fn is_chunk_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(CHUNK_EXTENSION))
        .is_some_and(|stem| stem.ends_with('.'))
}

/// List the chunks in `dir` in merge order.
///
/// Candidates are enumerated in file-name order and then stable-sorted by
/// sequence number, so equal sequence numbers keep their name order.
pub async fn discover_chunks(dir: impl AsRef<Path>) -> MediaResult<Vec<Chunk>> {
    let dir = dir.as_ref();
    let discovery_err = |source| MediaError::ChunkDiscovery {
        dir: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(discovery_err)?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(discovery_err)? {
        let path = entry.path();
        if !is_chunk_file(&path) {
            continue;
        }
        // Directories named `*.chunk` are not parts.
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => continue,
            _ => paths.push(path),
        }
    }

    paths.sort();
    let mut chunks: Vec<Chunk> = paths.into_iter().map(Chunk::new).collect();
    chunks.sort_by_key(|c| c.sequence);

    Ok(chunks)
}

/// Concatenate every chunk of `input_dir` into `output_file`.
///
/// The output is created or truncated first. The merge stops at the first
/// error and leaves whatever was written so far in place; a failed merge's
/// output must never be treated as a valid file. No chunks is not an error
/// and produces an empty file.
pub async fn merge_chunks(
    input_dir: impl AsRef<Path>,
    output_file: impl AsRef<Path>,
) -> MediaResult<MergeSummary> {
    let input_dir = input_dir.as_ref();
    let output_file = output_file.as_ref();

    let chunks = discover_chunks(input_dir).await?;
    info!(
        dir = %input_dir.display(),
        chunks = chunks.len(),
        "Merging chunks"
    );

    let mut output = File::create(output_file)
        .await
        .map_err(|source| MediaError::OutputCreate {
            path: output_file.to_path_buf(),
            source,
        })?;

    let mut summary = MergeSummary::default();

    for chunk in &chunks {
        let mut input = File::open(&chunk.path)
            .await
            .map_err(|source| MediaError::ChunkOpen {
                path: chunk.path.clone(),
                source,
            })?;

        let copied = tokio::io::copy(&mut input, &mut output)
            .await
            .map_err(|source| MediaError::ChunkAppend {
                path: chunk.path.clone(),
                source,
            })?;

        debug!(
            chunk = %chunk.path.display(),
            sequence = chunk.sequence,
            bytes = copied,
            "Appended chunk"
        );

        summary.chunks += 1;
        summary.bytes += copied;
    }

    output
        .flush()
        .await
        .map_err(|source| MediaError::OutputWrite {
            path: output_file.to_path_buf(),
            source,
        })?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_chunks(dir: &Path, chunks: &[(&str, &[u8])]) {
        for (name, content) in chunks {
            fs::write(dir.join(name), content).await.unwrap();
        }
    }

    #[test]
    fn test_extract_sequence_number() {
        assert_eq!(extract_sequence_number("chunk_1.chunk"), 1);
        assert_eq!(extract_sequence_number("chunk_10.chunk"), 10);
        assert_eq!(extract_sequence_number("part-0042.chunk"), 42);
        assert_eq!(extract_sequence_number("a12b34.chunk"), 12);
    }

    #[test]
    fn test_extract_sequence_uses_base_name_only() {
        assert_eq!(extract_sequence_number("/uploads/77/chunk_3.chunk"), 3);
    }

    #[test]
    fn test_extract_sequence_without_digits() {
        assert_eq!(extract_sequence_number("intro.chunk"), NO_SEQUENCE);
        assert_eq!(extract_sequence_number(""), NO_SEQUENCE);
    }

    #[test]
    fn test_extract_sequence_overflow_is_sentinel() {
        assert_eq!(
            extract_sequence_number("chunk_99999999999999999999999.chunk"),
            NO_SEQUENCE
        );
    }

    #[test]
    fn test_extract_sequence_ignores_non_ascii_digits() {
        // Arabic-Indic digits are not sequence numbers.
        assert_eq!(extract_sequence_number("chunk_\u{0663}.chunk"), NO_SEQUENCE);
    }

    #[tokio::test]
    async fn test_discover_orders_numerically() {
        let dir = TempDir::new().unwrap();
        write_chunks(
            dir.path(),
            &[
                ("chunk_2.chunk", b"B"),
                ("chunk_10.chunk", b"C"),
                ("chunk_1.chunk", b"A"),
            ],
        )
        .await;

        let chunks = discover_chunks(dir.path()).await.unwrap();
        let sequences: Vec<i64> = chunks.iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn test_discover_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        write_chunks(
            dir.path(),
            &[
                ("chunk_1.chunk", b"A"),
                ("merged.mp4", b"old"),
                ("notes_2.txt", b"x"),
            ],
        )
        .await;
        fs::create_dir(dir.path().join("dir_3.chunk")).await.unwrap();

        let chunks = discover_chunks(dir.path()).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].sequence, 1);
    }

    #[tokio::test]
    async fn test_discover_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = discover_chunks(dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, MediaError::ChunkDiscovery { .. }));
    }

    #[tokio::test]
    async fn test_merge_concatenates_in_sequence_order() {
        let dir = TempDir::new().unwrap();
        write_chunks(
            dir.path(),
            &[
                ("chunk_2.chunk", b"B"),
                ("chunk_10.chunk", b"C"),
                ("chunk_1.chunk", b"A"),
            ],
        )
        .await;
        let output = dir.path().join("merged.mp4");

        let summary = merge_chunks(dir.path(), &output).await.unwrap();

        assert_eq!(fs::read(&output).await.unwrap(), b"ABC");
        assert_eq!(summary, MergeSummary { chunks: 3, bytes: 3 });
    }

    #[tokio::test]
    async fn test_merge_puts_undigited_names_first() {
        let dir = TempDir::new().unwrap();
        write_chunks(
            dir.path(),
            &[
                ("chunk_0.chunk", b"1"),
                ("header.chunk", b"0"),
                ("chunk_5.chunk", b"2"),
            ],
        )
        .await;
        let output = dir.path().join("merged.mp4");

        merge_chunks(dir.path(), &output).await.unwrap();

        assert_eq!(fs::read(&output).await.unwrap(), b"012");
    }

    #[test]
    fn test_is_chunk_file() {
        assert!(is_chunk_file(Path::new("/u/1/chunk_1.chunk")));
        assert!(is_chunk_file(Path::new("/u/1/.chunk")));
        assert!(!is_chunk_file(Path::new("/u/1/chunk")));
        assert!(!is_chunk_file(Path::new("/u/1/part.chunks")));
        assert!(!is_chunk_file(Path::new("/u/1/merged.mp4")));
    }

    #[tokio::test]
    async fn test_merge_includes_bare_chunk_name() {
        let dir = TempDir::new().unwrap();
        write_chunks(dir.path(), &[(".chunk", b"H"), ("chunk_1.chunk", b"A")]).await;
        let output = dir.path().join("merged.mp4");

        let summary = merge_chunks(dir.path(), &output).await.unwrap();

        assert_eq!(summary.chunks, 2);
        assert_eq!(fs::read(&output).await.unwrap(), b"HA");
    }

    #[tokio::test]
    async fn test_merge_ties_keep_name_order() {
        let dir = TempDir::new().unwrap();
        write_chunks(
            dir.path(),
            &[("b_1.chunk", b"y"), ("a_1.chunk", b"x"), ("c_0.chunk", b"w")],
        )
        .await;
        let output = dir.path().join("merged.mp4");

        merge_chunks(dir.path(), &output).await.unwrap();

        assert_eq!(fs::read(&output).await.unwrap(), b"wxy");
    }

    #[tokio::test]
    async fn test_merge_without_chunks_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("merged.mp4");

        let summary = merge_chunks(dir.path(), &output).await.unwrap();

        assert_eq!(summary.chunks, 0);
        assert_eq!(fs::metadata(&output).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_merge_truncates_previous_output() {
        let dir = TempDir::new().unwrap();
        write_chunks(dir.path(), &[("chunk_1.chunk", b"new")]).await;
        let output = dir.path().join("merged.mp4");
        fs::write(&output, b"stale content from an earlier run").await.unwrap();

        merge_chunks(dir.path(), &output).await.unwrap();

        assert_eq!(fs::read(&output).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_merge_output_create_failure() {
        let dir = TempDir::new().unwrap();
        write_chunks(dir.path(), &[("chunk_1.chunk", b"A")]).await;
        let output = dir.path().join("no-such-dir").join("merged.mp4");

        let err = merge_chunks(dir.path(), &output).await.unwrap_err();
        assert!(matches!(err, MediaError::OutputCreate { .. }));
        assert!(err.is_chunk_io());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_merge_dangling_chunk_fails_on_open() {
        let dir = TempDir::new().unwrap();
        write_chunks(dir.path(), &[("chunk_1.chunk", b"A")]).await;
        std::os::unix::fs::symlink(
            dir.path().join("gone.bin"),
            dir.path().join("chunk_2.chunk"),
        )
        .unwrap();
        let output = dir.path().join("merged.mp4");

        let err = merge_chunks(dir.path(), &output).await.unwrap_err();

        assert!(matches!(err, MediaError::ChunkOpen { .. }));
        // Partial output stays behind with the chunks appended before the failure.
        assert_eq!(fs::read(&output).await.unwrap(), b"A");
    }
}
