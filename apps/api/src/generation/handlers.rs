//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::generation::blog::{generate_blog, BlogPost, BlogRequest};
use crate::generation::generator::{generate_qna, GenerationRequest, QnaResponse};
use crate::image::prompts::{proposal_image_prompt, ProposalImageRequest};
use crate::image::ImageOutcome;
use crate::state::AppState;

/// POST /api/qna
///
/// Search → strategy → draft with self-audit → optional design image.
pub async fn handle_qna(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<QnaResponse>, AppError> {
    let response = generate_qna(
        state.llm.as_ref(),
        state.auditor.as_ref(),
        &state.search,
        &state.images,
        request,
    )
    .await?;
    Ok(Json(response))
}

/// POST /api/blog
pub async fn handle_blog(
    State(state): State<AppState>,
    Json(request): Json<BlogRequest>,
) -> Result<Json<BlogPost>, AppError> {
    let post = generate_blog(state.llm.as_ref(), &state.search, request).await?;
    Ok(Json(post))
}

/// POST /api/proposal-image
///
/// Chain exhaustion is a 200 with `success: false`; only missing keys fail.
pub async fn handle_proposal_image(
    State(state): State<AppState>,
    Json(request): Json<ProposalImageRequest>,
) -> Result<Json<ImageOutcome>, AppError> {
    if request.company.trim().is_empty() || request.insurance_type.trim().is_empty() {
        return Err(AppError::Validation(
            "company and insurance_type cannot be empty".to_string(),
        ));
    }

    let prompt = proposal_image_prompt(&request);
    let outcome = state.images.generate(&prompt).await?;
    info!(
        "Proposal image for {:?}: success={} attempts={}",
        request.insurance_type, outcome.success, outcome.attempts
    );
    Ok(Json(outcome))
}
