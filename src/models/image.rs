use serde::{Deserialize, Serialize};
use validator::Validate;

/// POST /api/image/generate request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    // Missing and blank prompts are rejected by the service with "Missing Details"
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub prompt: String,
}

/// POST /api/image/generate response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub success: bool,
    pub message: String,
    pub credit_balance: i32,
    /// `data:<mime>;base64,<payload>`
    pub result_image: String,
}

/// Raw image returned by the upstream generator
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/png".to_string(),
        }
    }

    /// Inline data URL, as rendered directly by the web client
    pub fn to_data_url(&self) -> String {
        use base64::Engine;

        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Result of a successful credit-debited generation
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub image: GeneratedImage,
    pub credit_balance: i32,
}
