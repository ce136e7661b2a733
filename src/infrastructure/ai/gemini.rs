use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use super::poll::{poll_until_complete, OperationStatus, PollPolicy};
use super::wav::{pcm_to_wav, WavFormat};
use super::{AiError, AiService, GeneratedVideo, VideoRequest};
use crate::settings::AppConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";
const NARRATION_VOICE: &str = "Kore";

/// Google Generative Language API client.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    speech_model: String,
    video_model: String,
    poll: PollPolicy,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, AiError> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key: config.ai_api_key.clone(),
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
            text_model: config.ai_text_model.clone(),
            speech_model: config.ai_speech_model.clone(),
            video_model: config.ai_video_model.clone(),
            poll: PollPolicy {
                interval: config.video_poll_interval(),
                max_wait: config.video_max_wait(),
            },
        })
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::NotConfigured);
        }
        Ok(request.header(API_KEY_HEADER, &self.api_key))
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn generate_content(&self, model: &str, body: Value) -> Result<GenerateContentResponse, AiError> {
        let request = self.authorized(self.http.post(self.model_url(model, "generateContent")))?;
        let response = checked(request.json(&body).send().await?).await?;
        Ok(response.json::<GenerateContentResponse>().await?)
    }

    async fn write_script(&self, request: &VideoRequest) -> Result<String, AiError> {
        let response = self
            .generate_content(&self.text_model, text_prompt(&script_prompt(request)))
            .await?;
        let script = response.text()?;
        tracing::debug!(words = script.split_whitespace().count(), "Narration script written");
        Ok(script)
    }

    async fn narrate(&self, script: &str) -> Result<Vec<u8>, AiError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": script }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": NARRATION_VOICE } }
                }
            }
        });
        let response = self.generate_content(&self.speech_model, body).await?;
        let pcm = response.inline_data()?;
        tracing::debug!(bytes = pcm.len(), "Narration synthesized");
        Ok(pcm_to_wav(&pcm, WavFormat::default()))
    }

    async fn start_video(&self, request: &VideoRequest, script: &str, narration: &[u8]) -> Result<String, AiError> {
        let body = json!({
            "instances": [{
                "prompt": video_prompt(script),
                "image": {
                    "bytesBase64Encoded": STANDARD.encode(&request.cover_image),
                    "mimeType": request.cover_mime_type,
                },
                "audio": {
                    "bytesBase64Encoded": STANDARD.encode(narration),
                    "mimeType": "audio/wav",
                }
            }]
        });

        let http_request = self.authorized(self.http.post(self.model_url(&self.video_model, "predictLongRunning")))?;
        let response = checked(http_request.json(&body).send().await?).await?;
        let operation = response.json::<Operation>().await?;
        tracing::info!(operation = %operation.name, "Video operation started");
        Ok(operation.name)
    }

    async fn check_operation(&self, name: &str) -> Result<OperationStatus<String>, AiError> {
        let url = format!("{}/v1beta/{}", self.base_url, name);
        let response = checked(self.authorized(self.http.get(url))?.send().await?).await?;
        Ok(response.json::<Operation>().await?.status())
    }

    async fn download(&self, uri: &str) -> Result<GeneratedVideo, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::NotConfigured);
        }
        let response = checked(self.http.get(uri).query(&[("key", &self.api_key)]).send().await?).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("video/"))
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(AiError::InvalidResponse("downloaded video is empty".into()));
        }
        Ok(GeneratedVideo { mime_type, bytes })
    }
}

#[async_trait]
impl AiService for GeminiClient {
    async fn suggest_title(&self, description: &str) -> Result<String, AiError> {
        let mut body = text_prompt(&title_prompt(description));
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": { "title": { "type": "STRING" } },
                "required": ["title"]
            }
        });

        let response = self.generate_content(&self.text_model, body).await?;
        parse_title(&response.text()?)
    }

    async fn generate_video(&self, request: VideoRequest) -> Result<GeneratedVideo, AiError> {
        let script = self.write_script(&request).await?;
        let narration = self.narrate(&script).await?;
        let operation = self.start_video(&request, &script, &narration).await?;

        let uri = poll_until_complete(self.poll, || self.check_operation(&operation)).await?;
        self.download(&uri).await
    }
}

/// Maps non-2xx responses to `AiError::Api` carrying the provider's message.
async fn checked(response: Response) -> Result<Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(AiError::Api {
        status: status.as_u16(),
        message,
    })
}

fn text_prompt(prompt: &str) -> Value {
    json!({ "contents": [{ "role": "user", "parts": [{ "text": prompt }] }] })
}

fn title_prompt(description: &str) -> String {
    format!(
        "Eres un asistente amable diseñado para sugerir títulos creativos, concisos y románticos \
         para las entradas de un diario de pareja.\n\n\
         Basándote en la siguiente descripción, sugiere un título en español que capture la esencia del momento:\n\
         Descripción: {}\n\n\
         El título debe tener 10 palabras como máximo.\n\
         El título debe ser emotivo y reflejar el sentimiento general de la descripción.",
        description
    )
}

fn script_prompt(request: &VideoRequest) -> String {
    format!(
        "You are a romantic storyteller. Based on the following diary entry, create a short, \
         emotional voiceover script of about 50-70 words. The script should capture the feeling of the moment.\n\n\
         Title: {}\nDescription: {}\nAdditional notes: {}\n\n\
         Generate only the script text, without any labels like \"Script:\".",
        request.title,
        request.description,
        request.notes.join("; ")
    )
}

fn video_prompt(script: &str) -> String {
    format!(
        "Create an evocative, cinematic video that brings this memory to life. Start with the provided \
         image and make it subtly animate, like a gentle breeze or a soft focus pull. The feeling should \
         be romantic and nostalgic. Script: {}",
        script
    )
}

fn parse_title(raw: &str) -> Result<String, AiError> {
    #[derive(Deserialize)]
    struct TitleOutput {
        title: String,
    }

    let title = serde_json::from_str::<TitleOutput>(raw)?.title.trim().to_string();
    if title.is_empty() {
        return Err(AiError::InvalidResponse("empty title".into()));
    }
    Ok(title)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[allow(dead_code)]
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates.iter().flat_map(|c| c.content.parts.iter())
    }

    fn text(&self) -> Result<String, AiError> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            return Err(AiError::InvalidResponse("model returned no text".into()));
        }
        Ok(text.trim().to_string())
    }

    fn inline_data(&self) -> Result<Vec<u8>, AiError> {
        let data = self
            .parts()
            .find_map(|p| p.inline_data.as_ref())
            .ok_or_else(|| AiError::InvalidResponse("Audio generation failed.".into()))?;
        STANDARD
            .decode(&data.data)
            .map_err(|e| AiError::InvalidResponse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<ErrorBody>,
    response: Option<Value>,
}

impl Operation {
    fn status(self) -> OperationStatus<String> {
        if !self.done {
            return OperationStatus::Pending;
        }
        if let Some(error) = self.error {
            return OperationStatus::Failed(error.message);
        }

        let uri = self.response.as_ref().and_then(|response| {
            response
                .pointer("/generateVideoResponse/generatedSamples/0/video/uri")
                .or_else(|| response.pointer("/generatedVideos/0/video/uri"))
                .and_then(Value::as_str)
        });
        match uri {
            Some(uri) => OperationStatus::Done(uri.to_string()),
            None => OperationStatus::Failed("Generated operation result does not contain a video.".into()),
        }
    }
}
