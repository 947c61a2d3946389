//! Account management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use ferrobank_db::{
    entities::{accounts, entries},
    repositories::{
        account::{AccountError, AccountRepository},
        entry::EntryRepository,
    },
};
use ferrobank_shared::types::{PageRequest, PageResponse};

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts", get(list_accounts))
        .route("/accounts/{account_id}", get(get_account))
        .route("/accounts/{account_id}/entries", get(list_entries))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Currency code (must be in the supported set).
    pub currency: String,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Owner username.
    pub owner: String,
    /// Current balance in minor currency units.
    pub balance: i64,
    /// Currency code.
    pub currency: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<accounts::Model> for AccountResponse {
    fn from(account: accounts::Model) -> Self {
        Self {
            id: account.id,
            owner: account.owner,
            balance: account.balance,
            currency: account.currency,
            created_at: account.created_at.to_utc(),
        }
    }
}

/// Response for a ledger entry.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Account the entry is posted against.
    pub account_id: Uuid,
    /// Signed amount (positive = credit, negative = debit).
    pub amount: i64,
    /// Entry timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<entries::Model> for EntryResponse {
    fn from(entry: entries::Model) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            amount: entry.amount,
            created_at: entry.created_at.to_utc(),
        }
    }
}

/// Loads an account and checks the caller owns it.
///
/// Returns the account or a ready-made error response.
async fn load_owned_account(
    repo: &AccountRepository,
    account_id: Uuid,
    username: &str,
) -> Result<accounts::Model, axum::response::Response> {
    match repo.get_account(account_id).await {
        Ok(account) if account.owner == username => Ok(account),
        Ok(_) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Account does not belong to the authenticated user"
            })),
        )
            .into_response()),
        Err(AccountError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": format!("Account {account_id} not found")
            })),
        )
            .into_response()),
        Err(e) => {
            error!(error = %e, "Failed to load account");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred loading the account"
                })),
            )
                .into_response())
        }
    }
}

/// POST /accounts - Create an account for the authenticated user.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo.create_account(auth.username(), &payload.currency).await {
        Ok(account) => {
            info!(account_id = %account.id, owner = %account.owner, "Account created");
            (
                StatusCode::CREATED,
                Json(AccountResponse::from(account)),
            )
                .into_response()
        }
        Err(AccountError::UnsupportedCurrency(currency)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "unsupported_currency",
                "message": format!("Currency '{currency}' is not supported")
            })),
        )
            .into_response(),
        Err(e @ AccountError::DuplicateAccount(_, _)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "already_exists",
                "message": e.to_string()
            })),
        )
            .into_response(),
        Err(AccountError::OwnerNotFound(owner)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "owner_not_found",
                "message": format!("User '{owner}' not found")
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create account");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred creating the account"
                })),
            )
                .into_response()
        }
    }
}

/// GET /accounts - List the authenticated user's accounts.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo.list_by_owner(auth.username(), &page).await {
        Ok((accounts, total)) => {
            let data: Vec<AccountResponse> =
                accounts.into_iter().map(AccountResponse::from).collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(data, page.page, page.per_page, total)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list accounts");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred listing accounts"
                })),
            )
                .into_response()
        }
    }
}

/// GET /accounts/{account_id} - Fetch one of the authenticated user's accounts.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match load_owned_account(&repo, account_id, auth.username()).await {
        Ok(account) => (StatusCode::OK, Json(AccountResponse::from(account))).into_response(),
        Err(response) => response,
    }
}

/// GET /accounts/{account_id}/entries - Paginated ledger history.
async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let account_repo = AccountRepository::new((*state.db).clone());

    let account = match load_owned_account(&account_repo, account_id, auth.username()).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let entry_repo = EntryRepository::new((*state.db).clone());
    match entry_repo.list_for_account(account.id, &page).await {
        Ok((entries, total)) => {
            let data: Vec<EntryResponse> = entries.into_iter().map(EntryResponse::from).collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(data, page.page, page.per_page, total)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list entries");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred listing entries"
                })),
            )
                .into_response()
        }
    }
}
