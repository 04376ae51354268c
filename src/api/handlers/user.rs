use crate::{
    api::{
        AppState,
        auth::{AuthIdentity, AuthUser},
    },
    core::user::{self, AiKeyStatus, UserUpdate, UserView},
    errors::Result,
};
use axum::{Json, extract::State};

/// `POST /api/auth/signin`
pub async fn sign_in(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<UserView>> {
    let user = user::sign_in(&state.db, &identity).await?;
    Ok(Json(user.into()))
}

/// `GET /api/user`
pub async fn get_user(AuthUser(user): AuthUser) -> Json<UserView> {
    Json(user.into())
}

/// `PATCH /api/user`
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserView>> {
    let updated = user::update_user(&state.db, state.generator.cipher(), user, update).await?;
    Ok(Json(updated.into()))
}

/// `GET /api/user/ai-keys/status`
pub async fn ai_key_status(AuthUser(user): AuthUser) -> Json<AiKeyStatus> {
    Json(user::ai_key_status(&user))
}
