use crate::{
    error::{ApiError, Result},
    models::image::GenerationResult,
    services::image_provider::ImageGenerator,
    store::UserStore,
};
use std::{sync::Arc, time::Duration};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const MAX_PROMPT_CHARS: usize = 1000;

/// Credit-debited image generation
pub struct ImageService {
    users: Arc<dyn UserStore>,
    generator: Arc<dyn ImageGenerator>,
    upstream_timeout: Duration,
}

impl ImageService {
    pub fn new(
        users: Arc<dyn UserStore>,
        generator: Arc<dyn ImageGenerator>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            users,
            generator,
            upstream_timeout,
        }
    }

    /// Generate an image for `prompt` and charge the user one credit.
    ///
    /// The credit is taken only after the provider has returned an image, and
    /// only through `decrement_if_positive`: if a concurrent request spent the
    /// last credit meanwhile, this call fails with `InsufficientCredit` and the
    /// image is discarded.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate(&self, user_id: Uuid, prompt: &str) -> Result<GenerationResult> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ApiError::BadRequest("Missing Details".to_string()));
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ApiError::BadRequest(format!(
                "Prompt must be at most {} characters",
                MAX_PROMPT_CHARS
            )));
        }

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        // Cheap early rejection; the authoritative check is the conditional debit below
        if user.credit_balance <= 0 {
            return Err(ApiError::InsufficientCredit {
                balance: user.credit_balance,
            });
        }

        let image = tokio::time::timeout(self.upstream_timeout, self.generator.generate(prompt))
            .await
            .map_err(|_| {
                ApiError::UpstreamTimeout(format!(
                    "Image generation exceeded {}ms",
                    self.upstream_timeout.as_millis()
                ))
            })??;

        let Some(credit_balance) = self.users.decrement_if_positive(user_id).await? else {
            warn!(user_id = %user_id, "Credit spent by a concurrent request, discarding image");
            let balance = self
                .users
                .find_user(user_id)
                .await?
                .map(|u| u.credit_balance)
                .unwrap_or(0);
            return Err(ApiError::InsufficientCredit { balance });
        };

        info!(
            user_id = %user_id,
            credit_balance = credit_balance,
            "Image generated and credit debited"
        );

        Ok(GenerationResult {
            image,
            credit_balance,
        })
    }
}
