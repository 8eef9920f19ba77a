//! Page shell configuration.
//!
//! The page tree is rendered inside an identity-provider context and a theme
//! provider. This endpoint serves the values those providers are configured
//! with, so the frontend does not hard-code them.
//!
//! - GET /shell - App metadata and identity-provider appearance

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::config::ShellConfig;
use crate::state::AppState;

/// Page metadata.
#[derive(Debug, Serialize)]
pub struct AppMetadata {
    pub title: String,
    pub description: String,
}

/// Theme variables for the identity-provider components.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceVariables {
    pub color_primary: String,
    pub font_size: String,
}

/// Identity-provider appearance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    pub base_theme: String,
    pub variables: AppearanceVariables,
}

/// Response for GET /shell.
#[derive(Debug, Serialize)]
pub struct ShellResponse {
    pub metadata: AppMetadata,
    pub appearance: Appearance,
}

impl From<&ShellConfig> for ShellResponse {
    fn from(shell: &ShellConfig) -> Self {
        Self {
            metadata: AppMetadata {
                title: shell.title.clone(),
                description: shell.description.clone(),
            },
            appearance: Appearance {
                base_theme: shell.base_theme.clone(),
                variables: AppearanceVariables {
                    color_primary: shell.color_primary.clone(),
                    font_size: shell.font_size.clone(),
                },
            },
        }
    }
}

/// GET /shell - Shell configuration. No authentication required.
async fn get_shell(State(state): State<AppState>) -> Json<ShellResponse> {
    Json(ShellResponse::from(&state.config().shell))
}

/// Build shell routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/shell", get(get_shell))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{send, test_app};

    #[tokio::test]
    async fn test_shell_defaults() {
        let (app, _, _) = test_app();
        let (status, body) = send(&app, "GET", "/shell", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["title"], "LiveDoc");
        assert_eq!(body["appearance"]["baseTheme"], "dark");
        assert_eq!(body["appearance"]["variables"]["colorPrimary"], "#3371FF");
        assert_eq!(body["appearance"]["variables"]["fontSize"], "16px");
    }
}
