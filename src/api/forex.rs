use async_trait::async_trait;
use actix_web::{get, web, HttpResponse};
use chrono::NaiveDate;
use log::{debug, info, warn};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::database::model::{currency, forex};
use crate::error::{ApiError, ApiResult};

#[derive(Error, Debug)]
pub enum ForexError {
    #[error("Rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate service reported failure for {0}/{1}")]
    Rejected(String, String),
}

/// External source of historical conversion rates, consulted on cache misses.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Units of `against` per one unit of `base` on `date`.
    async fn convert(&self, base: &str, against: &str, date: NaiveDate) -> Result<f64, ForexError>;
}

/// Client for the exchangerate.host `/convert` endpoint.
pub struct ExchangeRateHost {
    client: reqwest::Client,
    base_url: String,
    access_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(default)]
    success: bool,
    result: Option<f64>,
}

impl ExchangeRateHost {
    pub fn new(base_url: impl Into<String>, access_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_key,
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateHost {
    async fn convert(&self, base: &str, against: &str, date: NaiveDate) -> Result<f64, ForexError> {
        let date = date.format("%Y-%m-%d").to_string();
        let mut query = vec![
            ("from", base),
            ("to", against),
            ("date", date.as_str()),
            ("amount", "1"),
        ];
        if let Some(key) = &self.access_key {
            query.push(("access_key", key.as_str()));
        }

        let body: ConvertResponse = self
            .client
            .get(format!("{}/convert", self.base_url))
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match body {
            ConvertResponse { success: true, result: Some(rate) } => Ok(rate),
            _ => Err(ForexError::Rejected(base.to_string(), against.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForexRate {
    pub entry_date: NaiveDate,
    pub currency_base: String,
    pub currency_against: String,
    pub rate: f64,
    /// Display name of `currency_against`
    pub currency_name: Option<String>,
}

impl ForexRate {
    fn new(row: forex::Model, currency_name: Option<String>) -> Self {
        Self {
            entry_date: row.entry_date,
            currency_base: row.currency_base,
            currency_against: row.currency_against,
            rate: row.rate,
            currency_name,
        }
    }
}

pub fn normalize_currency(code: &str) -> ApiResult<String> {
    let code = code.trim();
    if code.is_empty() || code.len() > 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ApiError::validation(format!("'{code}' is not a currency code")));
    }
    Ok(code.to_ascii_uppercase())
}

async fn currency_name<C: ConnectionTrait>(db: &C, code: &str) -> Result<Option<String>, sea_orm::DbErr> {
    Ok(currency::Entity::find_by_id(code.to_string())
        .one(db)
        .await?
        .map(|c| c.currency_name))
}

/// Cached rate for the exact (date, base, against) key, fetching and storing it on a miss.
///
/// `Ok(None)` means the rate is unavailable; the external source failing is not an error.
pub async fn forex_by_date<C: ConnectionTrait>(
    db: &C,
    rates: &dyn RateSource,
    date: NaiveDate,
    base: &str,
    against: &str,
) -> ApiResult<Option<ForexRate>> {
    let base = normalize_currency(base)?;
    let against = normalize_currency(against)?;

    let cached = forex::Entity::find()
        .filter(forex::Column::EntryDate.eq(date))
        .filter(forex::Column::CurrencyBase.eq(base.as_str()))
        .filter(forex::Column::CurrencyAgainst.eq(against.as_str()))
        .one(db)
        .await?;

    if let Some(row) = cached {
        debug!("Forex cache hit: {} {}/{}", date, base, against);
        let name = currency_name(db, &against).await?;
        return Ok(Some(ForexRate::new(row, name)));
    }

    let rate = match rates.convert(&base, &against, date).await {
        Ok(rate) => rate,
        Err(e) => {
            warn!("Forex rate {} {}/{} unavailable: {}", date, base, against, e);
            return Ok(None);
        }
    };
    info!("Fetched forex rate {} {}/{} = {}", date, base, against, rate);

    let row = forex::Model {
        entry_date: date,
        currency_base: base,
        currency_against: against,
        rate,
    };
    let insert = forex::Entity::insert(forex::ActiveModel {
        entry_date: Set(row.entry_date),
        currency_base: Set(row.currency_base.clone()),
        currency_against: Set(row.currency_against.clone()),
        rate: Set(row.rate),
    })
    .on_conflict(
        OnConflict::columns([
            forex::Column::EntryDate,
            forex::Column::CurrencyBase,
            forex::Column::CurrencyAgainst,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await;
    if let Err(e) = insert {
        warn!("Failed to cache forex rate {} {}/{}: {}", date, row.currency_base, row.currency_against, e);
    }

    let name = currency_name(db, &row.currency_against).await.unwrap_or_else(|e| {
        warn!("Currency name lookup failed for {}: {}", row.currency_against, e);
        None
    });
    Ok(Some(ForexRate::new(row, name)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ForexQueryParams {
    /// Rate date, YYYY-MM-DD
    pub date: NaiveDate,
    /// ISO 4217 code of the base currency
    pub currency_base: String,
    /// ISO 4217 code of the quoted currency
    pub currency_against: String,
}

#[utoipa::path(
    get,
    path = "/api/forex",
    tag = "Forex",
    params(ForexQueryParams),
    responses(
        (status = 200, description = "Rate for the day, or null when unavailable", body = Option<ForexRate>),
        (status = 400, description = "Malformed currency code or date"),
        (status = 500, description = "Server error"),
    )
)]
#[get("")]
pub async fn get_forex_by_date(
    db: web::Data<DatabaseConnection>,
    rates: web::Data<dyn RateSource>,
    qp: web::Query<ForexQueryParams>,
) -> ApiResult<HttpResponse> {
    let rate = forex_by_date(
        db.get_ref(),
        rates.get_ref(),
        qp.date,
        &qp.currency_base,
        &qp.currency_against,
    )
    .await?;
    Ok(HttpResponse::Ok().json(rate))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/forex").service(get_forex_by_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingSource {
        calls: AtomicUsize,
        rate: Option<f64>,
    }

    impl CountingSource {
        fn new(rate: Option<f64>) -> Self {
            Self { calls: AtomicUsize::new(0), rate }
        }
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn convert(&self, base: &str, against: &str, _date: NaiveDate) -> Result<f64, ForexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rate
                .ok_or_else(|| ForexError::Rejected(base.to_string(), against.to_string()))
        }
    }

    fn new_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    fn us_dollar() -> currency::Model {
        currency::Model {
            currency: "USD".to_string(),
            currency_name: "United States dollar".to_string(),
        }
    }

    #[actix_web::test]
    async fn cache_hit_skips_rate_source() {
        let cached = forex::Model {
            entry_date: new_year(),
            currency_base: "SGD".to_string(),
            currency_against: "USD".to_string(),
            rate: 0.7457,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![cached.clone()]])
            .append_query_results([vec![us_dollar()]])
            .into_connection();
        let source = CountingSource::new(Some(1.0));

        let rate = forex_by_date(&db, &source, new_year(), "SGD", "USD")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(rate.rate, 0.7457);
        assert_eq!(rate.currency_name.as_deref(), Some("United States dollar"));
    }

    #[actix_web::test]
    async fn miss_fetches_and_persists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<forex::Model>::new()])
            .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }])
            .append_query_results([vec![us_dollar()]])
            .into_connection();
        let source = CountingSource::new(Some(0.75));

        let rate = forex_by_date(&db, &source, new_year(), "sgd", "usd")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rate.currency_base, "SGD");
        assert_eq!(rate.rate, 0.75);

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 3);
        assert!(format!("{:?}", log[1]).contains("ON CONFLICT"));
    }

    #[actix_web::test]
    async fn source_failure_is_null() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<forex::Model>::new()])
            .into_connection();
        let source = CountingSource::new(None);

        let rate = forex_by_date(&db, &source, new_year(), "SGD", "XXX").await.unwrap();
        assert!(rate.is_none());
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[actix_web::test]
    async fn bad_currency_code_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let source = CountingSource::new(Some(1.0));
        let err = forex_by_date(&db, &source, new_year(), "SGDX", "USD").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exchange_rate_host_parses_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/convert"))
            .and(query_param("from", "SGD"))
            .and(query_param("to", "USD"))
            .and(query_param("date", "2023-01-01"))
            .and(query_param("access_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": 0.7457
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = ExchangeRateHost::new(server.uri(), Some("secret".to_string()));
        let rate = source.convert("SGD", "USD", new_year()).await.unwrap();
        assert_eq!(rate, 0.7457);
    }

    #[tokio::test]
    async fn exchange_rate_host_unsuccessful_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/convert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": { "code": 101, "type": "missing_access_key" }
            })))
            .mount(&server)
            .await;

        let source: Arc<dyn RateSource> = Arc::new(ExchangeRateHost::new(server.uri(), None));
        let err = source.convert("SGD", "USD", new_year()).await.unwrap_err();
        assert!(matches!(err, ForexError::Rejected(_, _)));
    }

    #[tokio::test]
    async fn exchange_rate_host_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = ExchangeRateHost::new(format!("{}/", server.uri()), None);
        let err = source.convert("SGD", "USD", new_year()).await.unwrap_err();
        assert!(matches!(err, ForexError::Http(_)));
    }
}
