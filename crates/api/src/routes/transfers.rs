//! Transfer routes.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    middleware::AuthUser,
    routes::accounts::{AccountResponse, EntryResponse},
};
use ferrobank_core::currency::is_supported_currency;
use ferrobank_db::{
    entities::accounts,
    repositories::{
        account::{AccountError, AccountRepository},
        transfer::{TransferError, TransferInput, TransferRepository},
    },
};

/// Creates the transfer routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/transfers", post(create_transfer))
}

/// Request body for creating a transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// Source account (must belong to the authenticated user).
    pub from_account_id: Uuid,
    /// Destination account.
    pub to_account_id: Uuid,
    /// Amount in minor currency units (strictly positive).
    pub amount: i64,
    /// Currency both accounts must be denominated in.
    pub currency: String,
}

/// Response for a completed transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// The transfer record.
    pub transfer: TransferRecordResponse,
    /// Debit entry against the source account.
    pub from_entry: EntryResponse,
    /// Credit entry against the destination account.
    pub to_entry: EntryResponse,
    /// Source account after the transfer.
    pub from_account: AccountResponse,
    /// Destination account after the transfer.
    pub to_account: AccountResponse,
}

/// The transfer record itself.
#[derive(Debug, Serialize)]
pub struct TransferRecordResponse {
    /// Transfer ID.
    pub id: Uuid,
    /// Source account.
    pub from_account_id: Uuid,
    /// Destination account.
    pub to_account_id: Uuid,
    /// Transferred amount.
    pub amount: i64,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

fn currency_mismatch(account: &accounts::Model, currency: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "currency_mismatch",
            "message": format!(
                "Account {} is denominated in {}, not {}",
                account.id, account.currency, currency
            )
        })),
    )
        .into_response()
}

/// POST /transfers - Move funds between two accounts.
///
/// The source account must belong to the authenticated user and both
/// accounts must match the requested currency; the atomic work itself is
/// delegated to the transfer coordinator.
#[allow(clippy::too_many_lines)]
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    if payload.amount <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount",
                "message": "Transfer amount must be positive"
            })),
        )
            .into_response();
    }

    if !is_supported_currency(&payload.currency) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "unsupported_currency",
                "message": format!("Currency '{}' is not supported", payload.currency)
            })),
        )
            .into_response();
    }

    let account_repo = AccountRepository::new((*state.db).clone());

    // The source account must belong to the acting principal.
    let from_account = match account_repo.get_account(payload.from_account_id).await {
        Ok(account) => account,
        Err(AccountError::NotFound(id)) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": format!("Account {id} not found")
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to load source account");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred creating the transfer"
                })),
            )
                .into_response();
        }
    };

    if from_account.owner != auth.username() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Source account does not belong to the authenticated user"
            })),
        )
            .into_response();
    }

    if from_account.currency != payload.currency {
        return currency_mismatch(&from_account, &payload.currency);
    }

    let to_account = match account_repo.get_account(payload.to_account_id).await {
        Ok(account) => account,
        Err(AccountError::NotFound(id)) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": format!("Account {id} not found")
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to load destination account");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred creating the transfer"
                })),
            )
                .into_response();
        }
    };

    if to_account.currency != payload.currency {
        return currency_mismatch(&to_account, &payload.currency);
    }

    let transfer_repo = TransferRepository::new((*state.db).clone());
    let outcome = transfer_repo
        .transfer(TransferInput {
            from_account_id: payload.from_account_id,
            to_account_id: payload.to_account_id,
            amount: payload.amount,
        })
        .await;

    match outcome {
        Ok(outcome) => {
            info!(
                transfer_id = %outcome.transfer.id,
                from = %outcome.transfer.from_account_id,
                to = %outcome.transfer.to_account_id,
                amount = outcome.transfer.amount,
                "Transfer completed"
            );

            let response = TransferResponse {
                transfer: TransferRecordResponse {
                    id: outcome.transfer.id,
                    from_account_id: outcome.transfer.from_account_id,
                    to_account_id: outcome.transfer.to_account_id,
                    amount: outcome.transfer.amount,
                    created_at: outcome.transfer.created_at.to_utc(),
                },
                from_entry: EntryResponse::from(outcome.from_entry),
                to_entry: EntryResponse::from(outcome.to_entry),
                from_account: AccountResponse::from(outcome.from_account),
                to_account: AccountResponse::from(outcome.to_account),
            };

            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e @ (TransferError::SameAccount | TransferError::NonPositiveAmount(_))) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_transfer",
                "message": e.to_string()
            })),
        )
            .into_response(),
        Err(TransferError::InsufficientFunds {
            account_id,
            balance,
            requested,
        }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "insufficient_funds",
                "message": format!(
                    "Account {account_id} holds {balance}, cannot transfer {requested}"
                )
            })),
        )
            .into_response(),
        Err(TransferError::AccountNotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": format!("Account {id} not found")
            })),
        )
            .into_response(),
        Err(TransferError::Database(e)) => {
            error!(error = %e, "Transfer transaction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred creating the transfer"
                })),
            )
                .into_response()
        }
    }
}
