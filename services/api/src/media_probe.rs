//! Media property probing via ffprobe
//!
//! Uploaded videos carry `{duration, height, width}` in their persisted
//! descriptor; those values come from an ffprobe pass over the uploaded
//! bytes before they are pushed to blob storage.

use anyhow::Result;
use rand::RngCore;
use std::process::Command;
use tracing::error;

use crate::models::video::MediaProperties;

pub struct MediaProbe;

impl MediaProbe {
    /// Probe a media file on disk for duration and dimensions
    pub fn probe(file_path: &str) -> Result<MediaProperties> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(file_path)
            .output()?;

        if !output.status.success() {
            error!("ffprobe failed with status: {:?}", output.status);
            return Err(anyhow::anyhow!("ffprobe failed"));
        }

        let json_str = String::from_utf8(output.stdout)?;
        let ffprobe_data: serde_json::Value = serde_json::from_str(&json_str)?;

        Self::parse_ffprobe_output(&ffprobe_data)
    }

    /// Probe in-memory media bytes by spooling them to a temp file
    pub fn probe_bytes(bytes: &[u8]) -> Result<MediaProperties> {
        let mut suffix = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut suffix);
        let hex: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();
        let path = std::env::temp_dir().join(format!("clipstream-probe-{}", hex));

        std::fs::write(&path, bytes)?;
        let result = Self::probe(&path.to_string_lossy());
        let _ = std::fs::remove_file(&path);
        result
    }

    fn parse_ffprobe_output(ffprobe_data: &serde_json::Value) -> Result<MediaProperties> {
        let mut properties = MediaProperties {
            duration: 0.0,
            height: 0,
            width: 0,
        };

        if let Some(format) = ffprobe_data.get("format") {
            if let Some(duration_str) = format.get("duration").and_then(|v| v.as_str()) {
                properties.duration = duration_str.parse::<f64>().unwrap_or(0.0);
            }
        }

        if let Some(streams) = ffprobe_data.get("streams").and_then(|v| v.as_array()) {
            for stream in streams {
                let codec_type = stream.get("codec_type").and_then(|v| v.as_str());
                if codec_type == Some("video") {
                    if let Some(width) = stream.get("width").and_then(|v| v.as_i64()) {
                        properties.width = width as i32;
                    }
                    if let Some(height) = stream.get("height").and_then(|v| v.as_i64()) {
                        properties.height = height as i32;
                    }
                    break;
                }
            }
        }

        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_duration_and_dimensions() {
        let data = json!({
            "format": { "duration": "12.480000" },
            "streams": [
                { "codec_type": "audio", "sample_rate": "44100" },
                { "codec_type": "video", "width": 1920, "height": 1080 }
            ]
        });

        let props = MediaProbe::parse_ffprobe_output(&data).unwrap();
        assert!((props.duration - 12.48).abs() < 1e-9);
        assert_eq!(props.width, 1920);
        assert_eq!(props.height, 1080);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let props = MediaProbe::parse_ffprobe_output(&json!({})).unwrap();
        assert_eq!(props.duration, 0.0);
        assert_eq!(props.width, 0);
        assert_eq!(props.height, 0);
    }
}
