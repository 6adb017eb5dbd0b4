//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{self, auth, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Smart Library API",
        version = "1.0.0",
        description = "Library back office: catalog, members, loans and activity log",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Entity dispatch
        api::dispatch,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::MeResponse,
            crate::models::user::Identity,
            // Catalog
            crate::models::category::Category,
            crate::models::category::CategoryInput,
            crate::models::book::Book,
            crate::models::book::BookInput,
            // Users
            crate::models::user::UserRecord,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::enums::Role,
            // Loans
            crate::models::loan::LoanRecord,
            crate::models::loan::CreateLoanRequest,
            crate::models::loan::LoanPatchRequest,
            crate::models::enums::LoanStatus,
            // Dashboard & log
            crate::models::dashboard::Dashboard,
            crate::models::dashboard::DashboardTotals,
            crate::models::dashboard::RecentLoan,
            crate::models::dashboard::OverdueLoan,
            crate::models::activity::ActivityEntry,
            // Common
            api::RecordId,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "api", description = "Entity endpoint (auth, categories, books, users, loans, dashboard, logs)")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
