//! MPEG-DASH packaging of a merged upload.

use std::path::{Path, PathBuf};

use tracing::info;
use vconv_models::MANIFEST_FILE_NAME;

use crate::command::{FfmpegCommand, Transcoder};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ensure_dir;

/// FFmpeg muxer producing a DASH manifest plus segments.
pub const DASH_FORMAT: &str = "dash";

/// Package `input` as DASH into `output_dir`, returning the manifest path.
///
/// `output_dir` is created if needed. A non-zero transcoder exit becomes
/// [`MediaError::FfmpegFailed`] with the transcoder's combined output in
/// its message. The input file is left in place.
pub async fn package_dash(
    transcoder: &dyn Transcoder,
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    log_level: &str,
) -> MediaResult<PathBuf> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    ensure_dir(output_dir).await?;

    let manifest = output_dir.join(MANIFEST_FILE_NAME);
    let cmd = FfmpegCommand::new(input, &manifest)
        .format(DASH_FORMAT)
        .log_level(log_level);

    info!(
        input = %input.display(),
        manifest = %manifest.display(),
        "Converting video to mpeg-dash"
    );

    let output = transcoder.run(&cmd).await?;
    if !output.success() {
        return Err(MediaError::ffmpeg_failed(
            format!(
                "failed to convert video to mpeg-dash (exit code {}), output: {}",
                output
                    .exit_code
                    .map_or_else(|| "none".to_string(), |c| c.to_string()),
                output.combined_output
            ),
            output.combined_output,
            output.exit_code,
        ));
    }

    Ok(manifest)
}
