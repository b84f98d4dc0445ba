//! Remote style transfer over HTTP
//!
//! Talks to a style-transfer bridge service. Audio is exchanged through WAV
//! files in the system temp directory: the bridge reads `input_path` and
//! writes its result to `output_path`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::StyleTransfer;
use crate::engine::{export_audio, import_audio, AudioBuffer, ExportFormat};
use crate::error::{Result, StudioError};

/// Request body for `POST {bridge}/style-transfer`
#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    style: &'a str,
    input_path: String,
    output_path: String,
}

/// Response body from the bridge
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    success: bool,
    #[serde(default)]
    output_path: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Temp file removed when dropped
struct TempWav(PathBuf);

impl TempWav {
    fn new(tag: &str) -> Self {
        Self(env::temp_dir().join(format!("voice-studio-{}-{}.wav", tag, Uuid::new_v4())))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempWav {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = fs::remove_file(&self.0) {
                warn!("Failed to remove temp file {}: {}", self.0.display(), e);
            }
        }
    }
}

/// Style transfer delegated to a bridge service
#[derive(Debug, Clone)]
pub struct BridgeStyleTransfer {
    style: String,
    bridge_url: String,
    timeout_ms: u64,
}

impl BridgeStyleTransfer {
    pub fn new(style: &str, bridge_url: &str, timeout_ms: u64) -> Self {
        Self {
            style: style.to_string(),
            bridge_url: bridge_url.trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    pub fn bridge_url(&self) -> &str {
        &self.bridge_url
    }

    fn endpoint(&self) -> String {
        format!("{}/style-transfer", self.bridge_url)
    }

    fn send_request(&self, request: &BridgeRequest<'_>) -> Result<BridgeResponse> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| StudioError::BridgeUnavailable {
                reason: e.to_string(),
            })?;

        let response = client
            .post(self.endpoint())
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    StudioError::BridgeTimeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else if e.is_connect() {
                    StudioError::BridgeUnavailable {
                        reason: format!("Cannot connect to bridge at {}: {}", self.bridge_url, e),
                    }
                } else {
                    StudioError::StyleTransferFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(StudioError::BridgeUnavailable {
                reason: format!("Bridge returned error: {}", response.status()),
            });
        }

        response
            .json::<BridgeResponse>()
            .map_err(|e| StudioError::StyleTransferFailed {
                reason: format!("Invalid response from bridge: {}", e),
            })
    }
}

impl StyleTransfer for BridgeStyleTransfer {
    fn name(&self) -> &str {
        &self.style
    }

    fn apply(&self, audio: &AudioBuffer) -> Result<AudioBuffer> {
        let input = TempWav::new("in");
        let output = TempWav::new("out");
        export_audio(audio, input.path(), ExportFormat::default())?;

        let request = BridgeRequest {
            style: &self.style,
            input_path: input.path().to_string_lossy().to_string(),
            output_path: output.path().to_string_lossy().to_string(),
        };
        debug!("Sending style '{}' to {}", self.style, self.endpoint());
        let response = self.send_request(&request)?;

        if !response.success {
            return Err(StudioError::StyleTransferFailed {
                reason: response
                    .error_message
                    .unwrap_or_else(|| "Unknown bridge error".to_string()),
            });
        }

        // A reported location other than the requested one belongs to the
        // bridge; it is read but never removed here.
        match response.output_path {
            Some(path) if Path::new(&path) != output.path() => import_audio(Path::new(&path)),
            _ => import_audio(output.path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{calculate_peak, generate_test_tone, INTERNAL_SAMPLE_RATE};
    use serde_json::Value;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    fn read_request_body(stream: &mut TcpStream) -> Vec<u8> {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line.is_empty() || line == "\r\n" {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
        body
    }

    /// One-shot HTTP server; `respond` maps the request JSON to a status and body.
    /// The request is handed back once the response has been written.
    fn serve_once<F>(respond: F) -> (String, mpsc::Receiver<Value>)
    where
        F: FnOnce(&Value) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let body = read_request_body(&mut stream);
            let request: Value = serde_json::from_slice(&body).unwrap();
            let (status, payload) = respond(&request);
            let reply = format!(
                "HTTP/1.1 {} Bridge\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                payload.len(),
                payload
            );
            stream.write_all(reply.as_bytes()).unwrap();
            tx.send(request).unwrap();
        });

        (url, rx)
    }

    fn request_paths(request: &Value) -> (PathBuf, PathBuf) {
        (
            PathBuf::from(request["input_path"].as_str().unwrap()),
            PathBuf::from(request["output_path"].as_str().unwrap()),
        )
    }

    #[test]
    fn test_round_trip_through_bridge() {
        let (url, requests) = serve_once(|request| {
            let (input, output) = request_paths(request);
            let mut styled = import_audio(&input).unwrap();
            styled.apply_gain(-6.0);
            export_audio(&styled, &output, ExportFormat::default()).unwrap();
            (
                200,
                serde_json::json!({ "success": true, "output_path": output }).to_string(),
            )
        });
        let bridge = BridgeStyleTransfer::new("broadcast", &url, 5_000);
        let audio = generate_test_tone(440.0, 0.1, INTERNAL_SAMPLE_RATE);

        let styled = bridge.apply(&audio).unwrap();

        let request = requests.recv().unwrap();
        assert_eq!(request["style"], "broadcast");
        assert_eq!(styled.num_samples(), audio.num_samples());
        assert!(calculate_peak(&styled) < calculate_peak(&audio));

        let (input, output) = request_paths(&request);
        assert!(!input.exists());
        assert!(!output.exists());
    }

    #[test]
    fn test_reported_output_path_is_read_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("users_own_recording.wav");
        let original = generate_test_tone(220.0, 0.05, INTERNAL_SAMPLE_RATE);
        export_audio(&original, &recording, ExportFormat::default()).unwrap();

        let reported = recording.clone();
        let (url, requests) = serve_once(move |_| {
            (
                200,
                serde_json::json!({ "success": true, "output_path": reported }).to_string(),
            )
        });
        let bridge = BridgeStyleTransfer::new("broadcast", &url, 5_000);

        let styled = bridge
            .apply(&generate_test_tone(440.0, 0.1, INTERNAL_SAMPLE_RATE))
            .unwrap();

        assert_eq!(styled.num_samples(), original.num_samples());
        assert!(recording.exists());
        let (input, output) = request_paths(&requests.recv().unwrap());
        assert!(!input.exists());
        assert!(!output.exists());
    }

    #[test]
    fn test_unsuccessful_response() {
        let (url, requests) = serve_once(|_| {
            (
                200,
                r#"{"success": false, "error_message": "model not loaded"}"#.to_string(),
            )
        });
        let bridge = BridgeStyleTransfer::new("broadcast", &url, 5_000);

        let err = bridge
            .apply(&generate_test_tone(440.0, 0.05, INTERNAL_SAMPLE_RATE))
            .unwrap_err();

        assert!(matches!(err, StudioError::StyleTransferFailed { .. }), "{err}");
        assert!(err.to_string().contains("model not loaded"), "{err}");
        let (input, _) = request_paths(&requests.recv().unwrap());
        assert!(!input.exists());
    }

    #[test]
    fn test_error_status_is_unavailable() {
        let (url, requests) = serve_once(|_| (503, "{}".to_string()));
        let bridge = BridgeStyleTransfer::new("broadcast", &url, 5_000);

        let err = bridge
            .apply(&generate_test_tone(440.0, 0.05, INTERNAL_SAMPLE_RATE))
            .unwrap_err();

        assert!(matches!(err, StudioError::BridgeUnavailable { .. }), "{err}");
        assert!(err.to_string().contains("503"), "{err}");
        let (input, _) = request_paths(&requests.recv().unwrap());
        assert!(!input.exists());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let bridge = BridgeStyleTransfer::new("broadcast", "http://localhost:8001/", 1_000);
        assert_eq!(bridge.endpoint(), "http://localhost:8001/style-transfer");
    }

    #[test]
    fn test_unreachable_bridge_is_reported() {
        // Port 9 (discard) is closed on test machines
        let bridge = BridgeStyleTransfer::new("broadcast", "http://127.0.0.1:9", 2_000);
        let audio = generate_test_tone(440.0, 0.05, INTERNAL_SAMPLE_RATE);

        let err = bridge.apply(&audio).unwrap_err();
        assert!(
            matches!(
                err,
                StudioError::BridgeUnavailable { .. } | StudioError::BridgeTimeout { .. }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let temp = TempWav::new("test");
        let path = temp.path().to_path_buf();
        fs::write(&path, b"x").unwrap();
        drop(temp);
        assert!(!path.exists());
    }

    #[test]
    fn test_response_defaults() {
        let response: BridgeResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!response.success);
        assert!(response.output_path.is_none());
        assert!(response.error_message.is_none());
    }
}
