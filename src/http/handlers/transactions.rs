//! Transaction endpoints: keypairs, envelope building, payments and trust
//! authorization.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::http::handlers::RequestHandler;
use crate::http::response::ApiError;
use crate::ledger::keypair::is_valid_account_id;
use crate::ledger::types::validate_amount;
use crate::ledger::{Asset, Keypair, Memo, Operation, SubmitResponse, TransactionBuilder};

#[derive(Debug, Serialize)]
pub struct KeypairResponse {
    pub public_key: String,
    pub private_key: String,
}

pub async fn create_keypair() -> Json<KeypairResponse> {
    let keypair = Keypair::random();
    Json(KeypairResponse {
        public_key: keypair.address(),
        private_key: keypair.seed(),
    })
}

#[derive(Debug, Deserialize)]
pub struct BuilderRequest {
    pub source: String,
    pub sequence_number: String,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub memo_type: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub signers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BuilderResponse {
    pub transaction_envelope: String,
}

/// Build and sign an envelope without submitting it.
pub async fn builder(
    State(handler): State<Arc<RequestHandler>>,
    Json(request): Json<BuilderRequest>,
) -> Result<Json<BuilderResponse>, ApiError> {
    let sequence: u64 = request.sequence_number.parse().map_err(|_| {
        ApiError::bad_request("invalid_parameter", "sequence_number must be an integer")
    })?;
    let signers = request
        .signers
        .iter()
        .map(|seed| Keypair::from_seed(seed))
        .collect::<Result<Vec<_>, _>>()?;
    let signer_refs: Vec<&Keypair> = signers.iter().collect();

    let envelope = TransactionBuilder::new(request.source, sequence)
        .memo(Memo::from_parts(&request.memo_type, &request.memo)?)
        .operations(request.operations)
        .build()?
        .sign(&handler.services().config.network_passphrase, &signer_refs)?
        .encode()?;

    Ok(Json(BuilderResponse {
        transaction_envelope: envelope,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentRequest {
    /// Secret seed of the sender; the base account when empty.
    pub source: String,
    /// Account id or `name*domain` federation address.
    pub destination: String,
    pub amount: String,
    pub asset_code: String,
    pub asset_issuer: String,
    pub memo_type: String,
    pub memo: String,
}

pub async fn payment_query(
    State(handler): State<Arc<RequestHandler>>,
    Query(request): Query<PaymentRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    send_payment(&handler, request).await.map(Json)
}

pub async fn payment_form(
    State(handler): State<Arc<RequestHandler>>,
    Form(request): Form<PaymentRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    send_payment(&handler, request).await.map(Json)
}

async fn send_payment(
    handler: &RequestHandler,
    request: PaymentRequest,
) -> Result<SubmitResponse, ApiError> {
    let services = handler.services();
    let seed = if request.source.is_empty() {
        services.config.accounts.base_seed.as_str()
    } else {
        request.source.as_str()
    };
    if seed.is_empty() {
        return Err(ApiError::bad_request(
            "missing_parameter",
            "source is required when no base account is configured",
        ));
    }
    if request.destination.is_empty() {
        return Err(ApiError::bad_request("missing_parameter", "destination is required"));
    }

    validate_amount(&request.amount)?;
    let asset = Asset::from_parts(&request.asset_code, &request.asset_issuer)?;
    let destination = services.federation.lookup(&request.destination).await?;

    let memo = match (&destination.memo_type, &destination.memo) {
        (Some(memo_type), Some(memo)) if request.memo_type.is_empty() => {
            Memo::from_parts(memo_type, memo)?
        }
        _ => Memo::from_parts(&request.memo_type, &request.memo)?,
    };

    let operation = Operation::Payment {
        destination: destination.account_id,
        asset,
        amount: request.amount,
    };
    Ok(services.submitter.submit(seed, vec![operation], memo).await?)
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub account_id: String,
    pub asset_code: String,
}

/// Allow `account_id` to hold `asset_code`, signed by the authorizing account.
pub async fn authorize(
    State(handler): State<Arc<RequestHandler>>,
    Form(request): Form<AuthorizeRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let services = handler.services();
    if !is_valid_account_id(&request.account_id) {
        return Err(ApiError::bad_request("invalid_parameter", "account_id is invalid"));
    }
    if !services
        .config
        .assets
        .iter()
        .any(|asset| asset.code == request.asset_code)
    {
        return Err(ApiError::bad_request(
            "invalid_parameter",
            format!("asset {} is not configured", request.asset_code),
        ));
    }

    let operation = Operation::AllowTrust {
        trustor: request.account_id,
        asset_code: request.asset_code,
        authorize: true,
    };
    let response = services
        .submitter
        .submit(
            &services.config.accounts.authorizing_seed,
            vec![operation],
            Memo::None,
        )
        .await?;
    Ok(Json(response))
}
