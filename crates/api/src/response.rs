//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lectern_common::{AppError, AppResult};
use serde::Serialize;

use crate::extractors::ResponseMode;

/// Cookie carrying a one-shot message across a redirect.
pub const FLASH_COOKIE: &str = "flash";

/// Cookie holding the flash message's status (`success` or `error`).
pub const FLASH_STATUS_COOKIE: &str = "flash_status";

/// Where form posts land when nothing better is known.
pub const DEFAULT_REDIRECT: &str = "/staffs";

/// Standard success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    /// Success carrying data only.
    pub const fn data(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data: Some(data),
            redirect_url: None,
        }
    }

    /// Success carrying a message and data.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: Some(data),
            redirect_url: None,
        }
    }
}

impl Envelope<()> {
    /// Success carrying a message only.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: None,
            redirect_url: None,
        }
    }

    /// Attach the URL a browser should continue to.
    #[must_use]
    pub fn redirect_to(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Answer a staff mutation in the caller's [`ResponseMode`].
///
/// JSON callers get the envelope or the error body. Form posts are sent on
/// to `redirect_url`, the referring page or [`DEFAULT_REDIRECT`], with the
/// outcome in the flash cookies. The referring page is only followed when
/// it is on this site; see [`ResponseMode::from_headers`].
pub fn reply(mode: ResponseMode, result: AppResult<Envelope<()>>) -> Response {
    match mode {
        ResponseMode::Json => match result {
            Ok(envelope) => envelope.into_response(),
            Err(e) => e.into_response(),
        },
        ResponseMode::Redirect { referer } => {
            let (status, message, target) = match result {
                Ok(envelope) => (
                    "success",
                    envelope.message.unwrap_or_default(),
                    envelope.redirect_url.or(referer),
                ),
                Err(e) => {
                    log_error(&e);
                    ("error", e.public_message(), referer)
                }
            };
            let target = target.unwrap_or_else(|| DEFAULT_REDIRECT.to_string());
            (flash(status, &message), Redirect::to(&target)).into_response()
        }
    }
}

fn log_error(e: &AppError) {
    if e.is_server_error() {
        tracing::error!(error = %e, code = e.error_code(), "Server error occurred");
    } else {
        tracing::debug!(error = %e, code = e.error_code(), "Client error occurred");
    }
}

fn flash(status: &'static str, message: &str) -> CookieJar {
    let cookie = |name: &'static str, value: String| {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .build()
    };
    // The jar percent-encodes values on the way out and decodes them on the way in.
    CookieJar::new()
        .add(cookie(FLASH_COOKIE, message.to_string()))
        .add(cookie(FLASH_STATUS_COOKIE, status.to_string()))
}

/// Read and clear a pending flash message.
#[must_use]
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<(String, String)>) {
    let Some(message) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let status = jar
        .get(FLASH_STATUS_COOKIE)
        .map_or_else(|| "success".to_string(), |c| c.value().to_string());

    let jar = jar
        .remove(Cookie::build(FLASH_COOKIE).path("/"))
        .remove(Cookie::build(FLASH_STATUS_COOKIE).path("/"));
    (jar, Some((status, message)))
}

/// `201 Created` with a message and the new record.
pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope::with_message(message, data))).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, LOCATION, SET_COOKIE},
    };
    use serde_json::json;

    #[test]
    fn test_envelope_skips_empty_fields() {
        let body = serde_json::to_value(Envelope::message("Staff Deleted Successfully")).unwrap();
        assert_eq!(
            body,
            json!({"status": "success", "message": "Staff Deleted Successfully"})
        );
    }

    #[test]
    fn test_reply_json_mode() {
        let response = reply(ResponseMode::Json, Ok(Envelope::message("done")));
        assert_eq!(response.status(), StatusCode::OK);

        let response = reply(
            ResponseMode::Json,
            Err(AppError::Forbidden("nope".to_string())),
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_reply_redirect_prefers_redirect_url() {
        let response = reply(
            ResponseMode::Redirect {
                referer: Some("/staffs/create".to_string()),
            },
            Ok(Envelope::message("Staff Created Successfully").redirect_to("/staffs")),
        );

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/staffs");
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(cookies.iter().any(|c| c.starts_with("flash=Staff%20Created%20Successfully")));
        assert!(!cookies.iter().any(|c| c.contains("%25")));
    }

    #[test]
    fn test_flash_survives_the_browser_round_trip() {
        let message = "Staff Created Successfully: José 100%";
        let response = reply(
            ResponseMode::Redirect { referer: None },
            Ok(Envelope::message(message).redirect_to("/staffs")),
        );

        let sent: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()?.split(';').next().map(str::to_string))
            .collect();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&sent.join("; ")).unwrap());

        let (_, taken) = take_flash(CookieJar::from_headers(&headers));
        assert_eq!(taken, Some(("success".to_string(), message.to_string())));
    }

    #[test]
    fn test_reply_redirect_error_goes_back() {
        let response = reply(
            ResponseMode::Redirect {
                referer: Some("/staffs/create".to_string()),
            },
            Err(AppError::invalid("email", "The email has already been taken.")),
        );

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/staffs/create");
    }

    #[test]
    fn test_take_flash() {
        let jar = flash("error", "Failed to delete staff");
        let (_, taken) = take_flash(jar);
        assert_eq!(
            taken,
            Some(("error".to_string(), "Failed to delete staff".to_string()))
        );

        let (_, none) = take_flash(CookieJar::new());
        assert!(none.is_none());
    }
}
