//! Request extractors.

use axum::{
    body::Bytes,
    extract::{self, FromRequest, FromRequestParts, Request},
    http::{
        HeaderMap, HeaderName, Uri,
        header::{ACCEPT, CONTENT_TYPE, HOST, REFERER},
        request::Parts,
    },
};
use lectern_common::{AppError, AppResult, FieldErrors};
use lectern_db::entities::user;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Query string extractor answering failures with the JSON error body.
#[derive(Debug, Clone)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extract::Query(value) = extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Path parameter extractor answering failures with the JSON error body.
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extract::Path(value) = extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Request body kept as raw bytes until the handler decides to parse it.
///
/// Handlers run their authorization checks first and only then call
/// [`Payload::parse`], so an unauthorized caller never sees body errors.
#[derive(Debug, Clone)]
pub struct Payload {
    bytes: Bytes,
    form: bool,
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = is_form(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self { bytes, form })
    }
}

impl Payload {
    /// The body as a JSON value. An empty body reads as `{}`.
    pub fn value(&self) -> AppResult<Value> {
        if self.form {
            return parse_form(&self.bytes).map(Value::Object);
        }
        if self.bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_slice(&self.bytes).map_err(|e| {
            tracing::debug!(error = %e, "Malformed JSON body");
            AppError::invalid("body", MALFORMED_BODY_MESSAGE)
        })
    }

    /// Deserialize the body into `T`.
    ///
    /// Inputs read loosely typed fields themselves, so a failure here means
    /// the body has the wrong shape altogether.
    pub fn parse<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(self.value()?).map_err(|e| {
            tracing::debug!(error = %e, "Body does not match the expected input");
            AppError::Validation(FieldErrors::single("body", INVALID_BODY_MESSAGE))
        })
    }
}

const MALFORMED_BODY_MESSAGE: &str = "The request body must be valid JSON.";
const INVALID_BODY_MESSAGE: &str = "The given data was invalid.";

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Decode a urlencoded form into a map of strings. Later keys win.
fn parse_form(bytes: &[u8]) -> AppResult<Map<String, Value>> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes).map_err(|e| {
        tracing::debug!(error = %e, "Malformed form body");
        AppError::invalid("body", INVALID_BODY_MESSAGE)
    })?;
    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// How a staff mutation should be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseMode {
    /// Script callers: a JSON envelope.
    Json,
    /// Plain form posts: a redirect carrying a flash message.
    ///
    /// `referer` is the referring page as a local path, and `None` when the
    /// page was on another site.
    Redirect { referer: Option<String> },
}

impl<S> FromRequestParts<S> for ResponseMode
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

impl ResponseMode {
    /// Pick the mode from `Accept` and `X-Requested-With`.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &HeaderName| headers.get(name).and_then(|v| v.to_str().ok());

        let accepts_json = header(&ACCEPT).is_some_and(|v| v.contains("application/json"));
        let ajax = header(&X_REQUESTED_WITH)
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        if accepts_json || ajax {
            Self::Json
        } else {
            Self::Redirect {
                referer: header(&REFERER).and_then(|referer| local_path(referer, header(&HOST))),
            }
        }
    }
}

/// The path of `referer` when it points at this site.
fn local_path(referer: &str, host: Option<&str>) -> Option<String> {
    let uri: Uri = referer.parse().ok()?;
    let path = uri.path_and_query()?.as_str();
    if !path.starts_with('/') || path.starts_with("//") {
        return None;
    }

    match (uri.scheme(), uri.authority()) {
        (None, None) => Some(path.to_string()),
        (Some(_), Some(authority)) if host == Some(authority.as_str()) => Some(path.to_string()),
        _ => None,
    }
}
