use axum::Json;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest { pub tenant_id: Option<Uuid>, pub email: String, pub name: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

/// Free-form JSON object; `id`, `created_at` and `updated_at` are assigned by the server.
#[derive(utoipa::ToSchema)]
pub struct LocalRecordDoc {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::account::register,
        crate::routes::account::login,
        crate::routes::content::list_news,
        crate::routes::content::news_detail,
        crate::routes::content::list_events,
        crate::routes::categories::list,
        crate::routes::directory::list,
        crate::routes::directory::public_page,
        crate::routes::catalog::storefront,
        crate::routes::catalog::promotions,
        crate::routes::comments::list,
        crate::routes::store::place_order,
        crate::routes::store::plans,
        crate::routes::lookup::address,
        crate::routes::admin::public_collection,
        crate::routes::admin::list_subscribers,
        crate::routes::admin::audit_log,
        crate::routes::admin::create_local,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            LocalRecordDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "content"),
        (name = "categories"),
        (name = "directory"),
        (name = "catalog"),
        (name = "comments"),
        (name = "store"),
        (name = "lookup"),
        (name = "local"),
        (name = "admin")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_public_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/api/news", "/api/subscribers/{key}", "/api/address/{postal_code}", "/admin/audit-log"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
