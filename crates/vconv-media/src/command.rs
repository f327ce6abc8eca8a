//! FFmpeg command builder and runner.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            log_level: "error".to_string(),
        }
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set output container/packaging format.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(format)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments. Existing output is always overwritten.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
            "-i".to_string(),
            self.input.to_string_lossy().to_string(),
        ];

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// stdout and stderr, interleaved line by line in arrival order
    pub combined_output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Seam between the pipeline and the external transcoder.
///
/// `Err` means the process could not be run at all (missing binary, spawn
/// failure, timeout). A process that ran and exited non-zero is an `Ok`
/// whose [`CommandOutput`] carries the exit code and diagnostics.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<CommandOutput>;
}

/// Runs FFmpeg as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Binary name or path
    binary: String,
    /// Kill the process after this long
    timeout: Option<Duration>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            timeout: None,
        }
    }

    /// Use a different FFmpeg binary.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl Transcoder for FfmpegRunner {
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<CommandOutput> {
        let program = check_ffmpeg(&self.binary)?;
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", program.display(), args.join(" "));

        run_captured(&program, &args, self.timeout).await
    }
}

/// Resolve the FFmpeg binary.
pub fn check_ffmpeg(binary: &str) -> MediaResult<PathBuf> {
    which::which(binary).map_err(|_| MediaError::FfmpegNotFound(binary.to_string()))
}

/// Run a program to completion, capturing stdout and stderr together.
pub async fn run_captured<P, I, S>(
    program: P,
    args: I,
    timeout: Option<Duration>,
) -> MediaResult<CommandOutput>
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let Some(limit) = timeout else {
        return wait_with_output(&mut child).await;
    };

    let waited = tokio::time::timeout(limit, wait_with_output(&mut child)).await;
    match waited {
        Ok(result) => result,
        Err(_) => {
            warn!("Process timed out after {:?}, killing it", limit);
            let _ = child.kill().await;
            Err(MediaError::Timeout(limit))
        }
    }
}

async fn wait_with_output(child: &mut Child) -> MediaResult<CommandOutput> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| MediaError::internal("stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| MediaError::internal("stderr not captured"))?;

    let combined_output = collect_interleaved(stdout, stderr).await?;
    let status = child.wait().await?;

    Ok(CommandOutput {
        exit_code: status.code(),
        combined_output,
    })
}

/// Read two streams to EOF, appending lines to one buffer as they arrive.
///
/// Bytes are kept as read: a final line without a newline stays without one.
async fn collect_interleaved<A, B>(first: A, second: B) -> std::io::Result<String>
where
    A: AsyncRead + Unpin,
    B: AsyncRead + Unpin,
{
    let mut first = BufReader::new(first);
    let mut second = BufReader::new(second);
    // `read_until` keeps partially read bytes in these across select rounds,
    // so a stream can reach EOF with bytes still pending.
    let mut first_line = Vec::new();
    let mut second_line = Vec::new();
    let mut first_open = true;
    let mut second_open = true;
    let mut combined = String::new();

    while first_open || second_open {
        tokio::select! {
            read = first.read_until(b'\n', &mut first_line), if first_open => {
                if read? == 0 {
                    first_open = false;
                }
                push_line(&mut combined, &mut first_line);
            }
            read = second.read_until(b'\n', &mut second_line), if second_open => {
                if read? == 0 {
                    second_open = false;
                }
                push_line(&mut combined, &mut second_line);
            }
        }
    }

    Ok(combined)
}

fn push_line(buffer: &mut String, line: &mut Vec<u8>) {
    buffer.push_str(&String::from_utf8_lossy(line));
    line.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("merged.mp4", "mpeg-dash/output.mpd")
            .format("dash")
            .log_level("warning");

        let args = cmd.build_args();
        assert_eq!(
            args,
            vec![
                "-y",
                "-v",
                "warning",
                "-i",
                "merged.mp4",
                "-f",
                "dash",
                "mpeg-dash/output.mpd"
            ]
        );
    }

    #[test]
    fn test_output_args_follow_input() {
        let cmd = FfmpegCommand::new("in.mp4", "out.mpd").output_arg("-an");

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let flag_pos = args.iter().position(|a| a == "-an").unwrap();
        assert!(flag_pos > input_pos);
        assert_eq!(args.last().unwrap(), "out.mpd");
    }

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput {
            exit_code: Some(0),
            combined_output: String::new(),
        };
        let killed = CommandOutput {
            exit_code: None,
            combined_output: String::new(),
        };
        assert!(ok.success());
        assert!(!killed.success());
    }

    #[test]
    fn test_missing_binary() {
        let err = check_ffmpeg("definitely-not-an-ffmpeg-binary-xyz").unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound(_)));
    }

    #[tokio::test]
    async fn test_runner_reports_missing_binary() {
        let runner = FfmpegRunner::new().with_binary("definitely-not-an-ffmpeg-binary-xyz");
        let err = runner
            .run(&FfmpegCommand::new("a.mp4", "b.mpd"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captured_combines_streams() {
        let output = run_captured(
            "sh",
            ["-c", "echo to-stdout; echo to-stderr 1>&2; exit 3"],
            None,
        )
        .await
        .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(output.combined_output.contains("to-stdout"));
        assert!(output.combined_output.contains("to-stderr"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captured_success() {
        let output = run_captured("sh", ["-c", "printf done"], None).await.unwrap();
        assert!(output.success());
        assert_eq!(output.combined_output, "done");
    }

    #[tokio::test]
    async fn test_collect_keeps_output_verbatim() {
        let stdout: &[u8] = b"first\nmoov atom not found";
        let stderr: &[u8] = b"";

        let combined = collect_interleaved(stdout, stderr).await.unwrap();

        assert_eq!(combined, "first\nmoov atom not found");
    }

    #[tokio::test]
    async fn test_collect_reads_both_streams() {
        let stdout: &[u8] = b"out\n";
        let stderr: &[u8] = b"err\n";

        let combined = collect_interleaved(stdout, stderr).await.unwrap();

        assert_eq!(combined.len(), "out\nerr\n".len());
        assert!(combined.contains("out\n"));
        assert!(combined.contains("err\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captured_timeout() {
        let err = run_captured("sh", ["-c", "sleep 5"], Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Timeout(_)));
    }
}
