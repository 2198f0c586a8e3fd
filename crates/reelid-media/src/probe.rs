//! Video duration probing.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a video's duration in seconds.
///
/// Uses FFprobe when it is installed and reports a positive duration,
/// otherwise falls back to the `Duration:` line FFmpeg prints for its input.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    if which::which("ffprobe").is_ok() {
        match ffprobe_duration(path).await {
            Ok(duration) if duration > 0.0 => return Ok(duration),
            Ok(_) => debug!("FFprobe reported no duration for {}", path.display()),
            Err(e) => warn!("FFprobe failed for {}: {}", path.display(), e),
        }
    }

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(path)
        .args(["-f", "null", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    parse_ffmpeg_duration(&stderr)
        .filter(|d| *d > 0.0)
        .ok_or_else(|| MediaError::invalid_video("duration not found in ffmpeg output"))
}

async fn ffprobe_duration(path: &Path) -> MediaResult<f64> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    Ok(probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0))
}

/// Parse `Duration: HH:MM:SS.ss,` from FFmpeg's stderr banner.
pub(crate) fn parse_ffmpeg_duration(output: &str) -> Option<f64> {
    let start = output.find("Duration: ")? + "Duration: ".len();
    let rest = &output[start..];
    let end = rest.find(',')?;

    let parts: Vec<&str> = rest[..end].trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ffmpeg_duration() {
        let banner = "Input #0, mov,mp4\n  Duration: 00:01:30.50, start: 0.000000, bitrate: 1205 kb/s";
        let duration = parse_ffmpeg_duration(banner).unwrap();
        assert!((duration - 90.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ffmpeg_duration_missing() {
        assert_eq!(parse_ffmpeg_duration("no banner here"), None);
        assert_eq!(parse_ffmpeg_duration("Duration: N/A, start"), None);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_duration("/definitely/not/here.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
