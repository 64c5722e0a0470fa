//! Small accounts service used to drive the server end to end

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use commander_client::RestClient;
use commander_core::error_code::NOT_FOUND;
use commander_core::{
    BeanMapper, BusinessError, Direction, ErrorCode, FieldViolation, Page, Response, ResponseCodes, ValidationError,
};
use commander_server::{ApiError, JsonBody, Params, PathParam, ValidJson};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

pub const ACCOUNT_LOCKED: ErrorCode = ErrorCode::new(4100, "Account locked", 423);

pub const ERROR_CODES: [(&str, ErrorCode); 1] = [("ACCOUNT_LOCKED", ACCOUNT_LOCKED)];

pub const OWNERS: [&str; 7] = ["ada", "grace", "linus", "barbara", "ken", "dennis", "margaret"];

type ApiResult<T> = Result<Json<Response<T>>, ApiError>;

#[derive(Clone)]
struct AccountRow {
    id: u64,
    owner: &'static str,
    balance_cents: i64,
    locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: u64,
    pub owner: String,
    pub balance: String,
}

struct AccountMapper;

impl BeanMapper<AccountRow, AccountView> for AccountMapper {
    fn map(&self, source: &AccountRow) -> AccountView {
        AccountView {
            id: source.id,
            owner: source.owner.to_owned(),
            balance: format!("{}.{:02}", source.balance_cents / 100, source.balance_cents % 100),
        }
    }

    fn map_to(&self, source: &AccountRow, target: &mut AccountView) {
        target.id = source.id;
        target.balance = self.map(source).balance;
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 1, message = "must not be blank"))]
    pub owner: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub balance_cents: i64,
    #[validate(email(message = "must be an email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct Transfer {
    pub from: u64,
    pub to: u64,
    pub amount_cents: i64,
}

#[derive(Clone)]
pub struct AccountsState {
    client: RestClient,
    upstream: Url,
    rows: Arc<Vec<AccountRow>>,
}

impl AccountsState {
    pub fn new(client: RestClient, upstream: Url) -> Self {
        let rows: Vec<AccountRow> = OWNERS
            .into_iter()
            .zip(1_u64..)
            .map(|(owner, id)| AccountRow {
                id,
                owner,
                balance_cents: i64::try_from(id).unwrap_or_default() * 1050,
                locked: id == 3,
            })
            .collect();

        Self {
            client,
            upstream,
            rows: Arc::new(rows),
        }
    }
}

pub fn router(state: AccountsState) -> Router {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/import", post(import_account))
        .route("/accounts/search", get(search_accounts))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}/orders", get(account_orders))
        .route("/transfers", post(transfer))
        .route("/admin", get(admin))
        .route("/me", get(me))
        .route("/broken", get(broken))
        .route("/panic", get(panics))
        .with_state(state)
}

async fn list_accounts(
    State(state): State<AccountsState>,
    Extension(codes): Extension<ResponseCodes>,
    params: Params,
) -> ApiResult<Vec<AccountView>> {
    let paging = params.paging()?;

    let mut rows: Vec<&AccountRow> = state.rows.iter().collect();
    if let Some(order) = paging.sort().orders().first()
        && order.property() == "owner"
    {
        rows.sort_by_key(|row| row.owner);
        if order.direction() == Direction::Desc {
            rows.reverse();
        }
    }

    let start = usize::try_from(paging.offset()).map_err(ApiError::internal)?;
    let size = usize::try_from(paging.page_size()).map_err(ApiError::internal)?;
    let content: Vec<AccountView> = rows
        .into_iter()
        .skip(start)
        .take(size)
        .map(|row| AccountMapper.map(row))
        .collect();

    let total = u64::try_from(state.rows.len()).map_err(ApiError::internal)?;
    Ok(Json(Response::paged(&codes, Page::for_request(content, &paging, total))))
}

async fn create_account(
    Extension(codes): Extension<ResponseCodes>,
    ValidJson(account): ValidJson<NewAccount>,
) -> ApiResult<AccountView> {
    let row = AccountRow {
        id: 100,
        owner: "new",
        balance_cents: account.balance_cents,
        locked: false,
    };

    let mut view = AccountView {
        id: 0,
        owner: account.owner,
        balance: String::new(),
    };
    AccountMapper.map_to(&row, &mut view);
    Ok(Json(Response::succeeded(&codes, view)))
}

async fn import_account(
    Extension(codes): Extension<ResponseCodes>,
    JsonBody(account): JsonBody<NewAccount>,
) -> ApiResult<String> {
    Ok(Json(Response::succeeded(&codes, account.owner)))
}

async fn search_accounts(
    State(state): State<AccountsState>,
    Extension(codes): Extension<ResponseCodes>,
    params: Params,
) -> ApiResult<Vec<AccountView>> {
    let owner: String = params.required("owner")?;
    let limit: Option<usize> = params.optional("limit")?;

    let sources: Vec<AccountRow> = state
        .rows
        .iter()
        .filter(|row| row.owner.starts_with(&owner))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    let views = AccountMapper
        .map_all(Some(sources.as_slice()))
        .map_err(ApiError::internal)?;

    Ok(Json(Response::succeeded(&codes, views)))
}

async fn get_account(
    State(state): State<AccountsState>,
    Extension(codes): Extension<ResponseCodes>,
    PathParam(id): PathParam<u64>,
) -> ApiResult<AccountView> {
    let row = state
        .rows
        .iter()
        .find(|row| row.id == id)
        .ok_or_else(|| BusinessError::with_message(NOT_FOUND, format!("Account {id} not found")))?;

    if row.locked {
        return Err(BusinessError::new(ACCOUNT_LOCKED).into());
    }

    Ok(Json(Response::succeeded(&codes, AccountMapper.map(row))))
}

async fn account_orders(
    State(state): State<AccountsState>,
    Extension(codes): Extension<ResponseCodes>,
    Path(id): Path<u64>,
) -> ApiResult<serde_json::Value> {
    let mut uri = state.upstream.join("orders").map_err(ApiError::internal)?;
    uri.query_pairs_mut().append_pair("account", &id.to_string());

    let orders: serde_json::Value = state.client.get_for_object(&uri, None).await?;
    Ok(Json(Response::succeeded(&codes, orders)))
}

async fn transfer(Extension(codes): Extension<ResponseCodes>, JsonBody(transfer): JsonBody<Transfer>) -> ApiResult<()> {
    let mut violations = Vec::new();
    if transfer.from == transfer.to {
        violations.push(FieldViolation::new("to", "must differ from source account"));
    }
    if transfer.amount_cents <= 0 {
        violations.push(FieldViolation::new("amountCents", "must be positive"));
    }

    if !violations.is_empty() {
        return Err(ValidationError::new(violations).into());
    }

    Ok(Json(Response::empty(&codes)))
}

async fn admin() -> ApiResult<()> {
    Err(ApiError::Forbidden(Some("Access is denied".to_owned())))
}

async fn me() -> ApiResult<()> {
    Err(ApiError::unauthorized())
}

async fn broken() -> ApiResult<()> {
    let cause = anyhow::anyhow!("ledger connection reset").context("loading balances");
    Err(cause.into())
}

async fn panics() -> ApiResult<()> {
    panic!("ledger invariant violated")
}
