use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;

use crate::imaging::DataUri;

mod gemini;
mod poll;
mod wav;

pub use gemini::GeminiClient;
pub use poll::{poll_until_complete, OperationStatus, PollPolicy};
pub use wav::{pcm_to_wav, WavFormat};

#[derive(Debug, Display)]
pub enum AiError {
    #[display("AI provider is not configured")]
    NotConfigured,

    #[display("AI request failed: {_0}")]
    Request(String),

    #[display("AI provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[display("unexpected AI response: {_0}")]
    InvalidResponse(String),

    #[display("Video generation failed: {_0}")]
    OperationFailed(String),

    #[display("video generation did not finish within {}", humantime::format_duration(*_0))]
    Timeout(Duration),
}

impl std::error::Error for AiError {}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for AiError {
    fn from(err: serde_json::Error) -> Self {
        AiError::InvalidResponse(err.to_string())
    }
}

/// Everything the video chain needs to narrate one event.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub title: String,
    pub description: String,
    pub cover_image: Vec<u8>,
    pub cover_mime_type: String,
    /// Text of the event's text blocks, in timeline order.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVideo {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedVideo {
    pub fn to_data_uri(&self) -> String {
        DataUri::encode(&self.mime_type, &self.bytes)
    }
}

/// Generative AI collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiService: Send + Sync {
    /// Short romantic title (at most ten words) for a diary description.
    async fn suggest_title(&self, description: &str) -> Result<String, AiError>;

    /// Script, narration and video synthesis chained into one call.
    async fn generate_video(&self, request: VideoRequest) -> Result<GeneratedVideo, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_video_encodes_as_mp4_data_uri() {
        let video = GeneratedVideo {
            mime_type: "video/mp4".into(),
            bytes: vec![0, 0, 0, 0x18],
        };
        assert_eq!(video.to_data_uri(), "data:video/mp4;base64,AAAAGA==");
    }

    #[test]
    fn timeout_message_is_human_readable() {
        let err = AiError::Timeout(Duration::from_secs(600));
        assert_eq!(err.to_string(), "video generation did not finish within 10m");
    }
}
