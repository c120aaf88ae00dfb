use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::handlers::{health, logout, me, refresh, tokens, types};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tokenward",
        description = "Access/refresh credential issuance and session rotation"
    ),
    paths(
        tokens::issue_tokens,
        refresh::refresh_tokens,
        me::me,
        logout::logout,
        health::health,
    ),
    components(schemas(
        types::TokenPair,
        types::RefreshRequest,
        types::MeResponse,
        types::LogoutResponse,
        types::ErrorResponse,
        health::Health,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Credential issuance, rotation and logout"),
        (name = "user", description = "Authenticated user endpoints"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Generated OpenAPI document.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
