#![deny(unreachable_patterns)]
//! File and FFmpeg side of the upload pipeline.
//!
//! This crate provides:
//! - Chunk discovery and ordering by embedded sequence number
//! - Streaming merge of ordered chunks into one file
//! - Type-safe FFmpeg command building and a `Transcoder` seam
//! - DASH packaging of the merged upload

pub mod chunks;
pub mod command;
pub mod dash;
pub mod error;
pub mod fs_utils;

pub use chunks::{
    discover_chunks, extract_sequence_number, merge_chunks, Chunk, MergeSummary, CHUNK_EXTENSION,
    NO_SEQUENCE,
};
pub use command::{check_ffmpeg, run_captured, CommandOutput, FfmpegCommand, FfmpegRunner, Transcoder};
pub use dash::{package_dash, DASH_FORMAT};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{ensure_dir, remove_intermediate};
