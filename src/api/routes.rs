use super::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Everything under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(handlers::user::sign_in))
        .route(
            "/user",
            get(handlers::user::get_user).patch(handlers::user::update_user),
        )
        .route("/user/ai-keys/status", get(handlers::user::ai_key_status))
        .route(
            "/folder",
            get(handlers::folder::list_folders).post(handlers::folder::create_folder),
        )
        .route(
            "/folder/:id",
            get(handlers::folder::get_folder)
                .patch(handlers::folder::update_folder)
                .delete(handlers::folder::delete_folder),
        )
        .route(
            "/page",
            get(handlers::page::list_pages).post(handlers::page::create_page),
        )
        .route(
            "/page/:id",
            get(handlers::page::get_page)
                .patch(handlers::page::update_page)
                .delete(handlers::page::delete_page),
        )
        .route(
            "/page/:id/day/:day_index/entry",
            post(handlers::entry::add_entry),
        )
        .route(
            "/page/:id/day/:day_index/entry/:entry_id",
            patch(handlers::entry::update_entry).delete(handlers::entry::delete_entry),
        )
        .route(
            "/ai/summary/daily",
            get(handlers::summary::list_daily).post(handlers::summary::generate_daily),
        )
        .route(
            "/ai/summary/weekly",
            get(handlers::summary::list_weekly).post(handlers::summary::generate_weekly),
        )
        .route("/cron/weekly-email", get(handlers::cron::weekly_email))
}
