use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use tracing::{error, info};

use wallet_core::{WalletResult, WalletService};

use super::dto::{
    AddProductReq, BalanceDto, BalanceQuery, BalanceViewDto, BuyReq, FundReq, MessageDto, PayReq,
    ProductCreatedDto, ProductDto, PurchaseDto, RegisterReq, TransactionDto,
};
use super::error::ApiError;
use super::extract::{Authenticated, ValidJson};

/// Run a wallet operation on the blocking pool
///
/// Wallet operations touch DuckDB and may call the currency API, so they
/// never run on the async workers.
pub async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> WalletResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            error!("wallet operation panicked: {}", e);
            Err(ApiError::internal())
        }
    }
}

pub async fn health() -> Json<MessageDto> {
    Json(MessageDto::new("Digital Wallet API is running"))
}

pub async fn register(
    Extension(wallet): Extension<Arc<WalletService>>,
    ValidJson(req): ValidJson<RegisterReq>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let user = blocking(move || wallet.register(&req.username, &req.password)).await?;
    info!(user_id = %user.id, "registered user");
    Ok((StatusCode::CREATED, Json(MessageDto::new("User created successfully"))))
}

pub async fn fund(
    Extension(wallet): Extension<Arc<WalletService>>,
    Authenticated(caller): Authenticated,
    ValidJson(req): ValidJson<FundReq>,
) -> Result<Json<BalanceDto>, ApiError> {
    let balance = blocking(move || wallet.fund(&caller, req.amt)).await?;
    Ok(Json(BalanceDto { balance }))
}

pub async fn pay(
    Extension(wallet): Extension<Arc<WalletService>>,
    Authenticated(caller): Authenticated,
    ValidJson(req): ValidJson<PayReq>,
) -> Result<Json<BalanceDto>, ApiError> {
    let balance = blocking(move || wallet.pay(&caller, &req.to, req.amt)).await?;
    Ok(Json(BalanceDto { balance }))
}

pub async fn balance(
    Extension(wallet): Extension<Arc<WalletService>>,
    Authenticated(caller): Authenticated,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceViewDto>, ApiError> {
    let view = blocking(move || wallet.balance(&caller, query.currency.as_deref())).await?;
    Ok(Json(view.into()))
}

pub async fn statement(
    Extension(wallet): Extension<Arc<WalletService>>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<TransactionDto>>, ApiError> {
    let history = blocking(move || wallet.history(&caller)).await?;
    Ok(Json(history.into_iter().map(TransactionDto::from).collect()))
}

pub async fn add_product(
    Extension(wallet): Extension<Arc<WalletService>>,
    Authenticated(caller): Authenticated,
    ValidJson(req): ValidJson<AddProductReq>,
) -> Result<(StatusCode, Json<ProductCreatedDto>), ApiError> {
    let product = blocking(move || wallet.add_product(&caller, req.into())).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductCreatedDto {
            id: product.id,
            message: "Product added".to_string(),
        }),
    ))
}

pub async fn list_products(
    Extension(wallet): Extension<Arc<WalletService>>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let products = blocking(move || wallet.list_products()).await?;
    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

pub async fn buy(
    Extension(wallet): Extension<Arc<WalletService>>,
    Authenticated(caller): Authenticated,
    ValidJson(req): ValidJson<BuyReq>,
) -> Result<Json<PurchaseDto>, ApiError> {
    let balance = blocking(move || wallet.buy(&caller, req.product_id)).await?;
    Ok(Json(PurchaseDto {
        message: "Product purchased".to_string(),
        balance,
    }))
}
