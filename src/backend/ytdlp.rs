//! yt-dlp subprocess backend

use super::traits::{Backend, BackendCapabilities, FetchRequest};
use super::JobReporter;
use crate::config::YtDlpConfig;
use crate::error::BackendError;
use crate::quality::{DEFAULT_QUALITY_LABELS, Quality, select_resolution};
use crate::types::{Asset, JobStatus, VideoInfo};
use crate::utils::sanitize_filename;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

const NAME: &str = "yt-dlp";

/// Progress range the download phase is mapped into
const DOWNLOAD_PROGRESS_START: u8 = 20;
const DOWNLOAD_PROGRESS_END: u8 = 95;

static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%")
        .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// Backend running the external `yt-dlp` binary
///
/// Metadata comes from `--dump-single-json`; downloads land in the download
/// directory and are delivered by streaming. Every invocation runs under a
/// wall-clock timeout and the child is killed if the job goes away.
///
/// # Examples
///
/// ```no_run
/// use tubeproxy::backend::YtDlpBackend;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let backend = YtDlpBackend::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let backend = YtDlpBackend::from_path().expect("yt-dlp not found in PATH");
/// ```
pub struct YtDlpBackend {
    binary_path: PathBuf,
    probe_timeout: Duration,
    download_timeout: Duration,
}

/// Subset of the `--dump-single-json` document we use
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: String,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    vcodec: Option<String>,
}

impl YtDlpInfo {
    /// Distinct video heights, highest first
    fn heights(&self) -> Vec<u32> {
        let mut heights: Vec<u32> = self
            .formats
            .iter()
            .filter(|f| f.vcodec.as_deref() != Some("none"))
            .filter_map(|f| f.height)
            .filter(|h| *h > 0)
            .collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        heights
    }

    fn into_video_info(self) -> VideoInfo {
        let heights = self.heights();
        let qualities = if heights.is_empty() {
            DEFAULT_QUALITY_LABELS.iter().map(|q| q.to_string()).collect()
        } else {
            heights.iter().map(|h| format!("{h}p")).collect()
        };

        VideoInfo {
            title: self.title,
            author: self.channel.or(self.uploader).unwrap_or_default(),
            length_seconds: self.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
            view_count: self.view_count.unwrap_or(0),
            description: self.description.unwrap_or_default(),
            thumbnail: self.thumbnail.unwrap_or_default(),
            qualities,
        }
    }
}

impl YtDlpBackend {
    /// Create a backend with an explicit binary path and default timeouts
    pub fn new(binary_path: PathBuf) -> Self {
        let defaults = YtDlpConfig::default();
        Self {
            binary_path,
            probe_timeout: defaults.probe_timeout,
            download_timeout: defaults.download_timeout,
        }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// Returns `None` if the binary is not found.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Create from configuration, falling back to PATH discovery
    pub fn from_config(config: &YtDlpConfig) -> Option<Self> {
        let binary_path = match &config.binary {
            Some(path) => path.clone(),
            None => which::which("yt-dlp").ok()?,
        };
        Some(Self {
            binary_path,
            probe_timeout: config.probe_timeout,
            download_timeout: config.download_timeout,
        })
    }

    async fn probe(&self, url: &str) -> Result<YtDlpInfo, BackendError> {
        let mut command = Command::new(&self.binary_path);
        command
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--skip-download",
                "--no-warnings",
            ])
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.probe_timeout, command.output())
            .await
            .map_err(|_| BackendError::Timeout {
                backend: NAME.to_string(),
                after: self.probe_timeout,
            })?
            .map_err(|e| process_error(format!("failed to execute yt-dlp: {e}")))?;

        if !output.status.success() {
            return Err(BackendError::Rejected {
                backend: NAME.to_string(),
                message: last_error_line(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| BackendError::Parse {
            backend: NAME.to_string(),
            message: e.to_string(),
        })
    }

    /// Arguments selecting the output format for a quality
    fn format_args(quality: Quality, heights: &[u32]) -> Vec<String> {
        if quality.is_audio() {
            return vec![
                "-f".into(),
                "bestaudio/best".into(),
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
            ];
        }

        let selector = match select_resolution(heights, quality) {
            Some(height) => format!("bestvideo[height<={height}]+bestaudio/best[height<={height}]"),
            None => "bestvideo+bestaudio/best".to_string(),
        };
        vec![
            "-f".into(),
            selector,
            "--merge-output-format".into(),
            "mp4".into(),
            "--remux-video".into(),
            "mp4".into(),
        ]
    }

    async fn download(
        &self,
        url: &str,
        args: Vec<String>,
        output_template: &Path,
        reporter: &JobReporter,
    ) -> Result<(), BackendError> {
        let mut child = Command::new(&self.binary_path)
            .args(["--newline", "--no-playlist", "--no-warnings", "--no-mtime", "-o"])
            .arg(output_template)
            .args(&args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| process_error(format!("failed to start yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| process_error("no stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| process_error("no stderr".to_string()))?;
        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let run = async {
            // Split on raw bytes: titles in yt-dlp output are not always valid UTF-8
            let mut lines = BufReader::new(stdout).split(b'\n');
            let mut reported = DOWNLOAD_PROGRESS_START;
            while let Ok(Some(line)) = lines.next_segment().await {
                if let Some(pct) = parse_progress_line(&String::from_utf8_lossy(&line)) {
                    let mapped = map_download_progress(pct);
                    if mapped > reported {
                        reported = mapped;
                        reporter.progress(mapped).await?;
                    }
                }
            }
            child
                .wait()
                .await
                .map_err(|e| process_error(format!("yt-dlp process failed: {e}")))
        };

        let status = tokio::time::timeout(self.download_timeout, run)
            .await
            .map_err(|_| BackendError::Timeout {
                backend: NAME.to_string(),
                after: self.download_timeout,
            })??;

        if !status.success() {
            let stderr = stderr_reader.await.unwrap_or_default();
            return Err(process_error(format!(
                "exited with {status}: {}",
                last_error_line(&stderr)
            )));
        }
        Ok(())
    }
}

fn process_error(message: String) -> BackendError {
    BackendError::Process {
        backend: NAME.to_string(),
        message,
    }
}

/// Last non-empty stderr line, which is where yt-dlp puts its ERROR summary
fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}

/// Parse the percentage out of a `--newline` progress line
pub(crate) fn parse_progress_line(line: &str) -> Option<f64> {
    PROGRESS_LINE
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Map a 0-100 download percentage into the job's download progress range
fn map_download_progress(pct: f64) -> u8 {
    let span = f64::from(DOWNLOAD_PROGRESS_END - DOWNLOAD_PROGRESS_START);
    let mapped = f64::from(DOWNLOAD_PROGRESS_START) + pct.clamp(0.0, 100.0) / 100.0 * span;
    mapped.floor() as u8
}

#[async_trait]
impl Backend for YtDlpBackend {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            can_describe: true,
            can_fetch: true,
        }
    }

    async fn video_info(&self, url: &str) -> Result<VideoInfo, BackendError> {
        Ok(self.probe(url).await?.into_video_info())
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        reporter: &JobReporter,
    ) -> Result<Asset, BackendError> {
        reporter.stage(JobStatus::FetchingInfo, 5).await?;
        let info = self.probe(&request.url).await?;
        reporter.stage(JobStatus::FetchingInfo, 15).await?;

        let extension = request.quality.extension();
        let stem = sanitize_filename(&info.title);
        let filename = format!("{stem}.{extension}");
        reporter.filename(filename.clone()).await?;

        // On-disk name carries the job id so concurrent jobs for one video never collide
        let disk_stem = format!("{stem}_{}", request.job_id);
        tokio::fs::create_dir_all(&request.download_dir)
            .await
            .map_err(|e| process_error(format!("cannot create download dir: {e}")))?;
        let template = request.download_dir.join(format!("{disk_stem}.%(ext)s"));
        let path = request.download_dir.join(format!("{disk_stem}.{extension}"));

        let args = Self::format_args(request.quality, &info.heights());
        reporter
            .stage(JobStatus::Downloading, DOWNLOAD_PROGRESS_START)
            .await?;
        tracing::debug!(job_id = %request.job_id, ?args, "starting yt-dlp download");
        self.download(&request.url, args, &template, reporter).await?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(process_error(format!(
                "expected output {} was not produced",
                path.display()
            )));
        }

        Ok(Asset::Local { path, filename })
    }
}
