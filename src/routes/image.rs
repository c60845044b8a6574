use axum::{extract::State, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, AppJson, Result},
    middleware::UserIdentity,
    models::image::{GenerateImageRequest, GenerateImageResponse},
};

/// POST /api/image/generate
///
/// Debits one credit per generated image. Response:
/// ```json
/// {
///   "success": true,
///   "message": "Image Generated",
///   "creditBalance": 4,
///   "resultImage": "data:image/png;base64,iVBOR..."
/// }
/// ```
#[instrument(skip(state, request))]
pub async fn generate_image(
    State(state): State<AppState>,
    identity: UserIdentity,
    AppJson(request): AppJson<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let result = state
        .image_service
        .generate(identity.user_id, &request.prompt)
        .await?;

    Ok(Json(GenerateImageResponse {
        success: true,
        message: "Image Generated".to_string(),
        credit_balance: result.credit_balance,
        result_image: result.image.to_data_url(),
    }))
}
