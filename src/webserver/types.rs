//! JSON:API-ish response envelope (spec §6), reused directly from the
//! teacher's `webserver/types.rs`: an erased-serde trait object lets every
//! handler return its own concrete response type through one `Json<...>`
//! wrapper.

use std::borrow::Cow;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response as AxumResponse};

use crate::error::KoditError;

pub(crate) trait ApiResponse: erased_serde::Serialize {}
erased_serde::serialize_trait_object!(ApiResponse);

#[derive(serde::Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub(crate) enum Response<'a> {
    Ok(Box<dyn erased_serde::Serialize + Send + Sync + 'static>),
    Error(EndpointError<'a>),
}

impl<T: ApiResponse + Send + Sync + 'static> From<T> for Response<'static> {
    fn from(value: T) -> Self {
        Self::Ok(Box::new(value))
    }
}

#[derive(serde::Serialize, PartialEq, Eq, Debug)]
pub struct EndpointError<'a> {
    kind: ErrorKind,
    message: Cow<'a, str>,
}

#[allow(unused)]
#[derive(serde::Serialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    User,
    Unknown,
    NotFound,
    Configuration,
    UpstreamService,
    Internal,
}

pub(crate) fn json<'a, T>(val: T) -> Json<Response<'a>>
where
    Response<'a>: From<T>,
{
    Json(Response::from(val))
}

/// Wraps `KoditError` for handler `Result` returns, mapping the error
/// taxonomy's `status_code()` (spec §7) onto the HTTP response.
pub(crate) struct WebError(pub KoditError);

impl From<KoditError> for WebError {
    fn from(err: KoditError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> AxumResponse {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let kind = if status == StatusCode::NOT_FOUND {
            ErrorKind::NotFound
        } else if status == StatusCode::BAD_REQUEST {
            ErrorKind::User
        } else if status == StatusCode::SERVICE_UNAVAILABLE {
            ErrorKind::UpstreamService
        } else {
            ErrorKind::Internal
        };
        let body = Json(Response::Error(EndpointError {
            kind,
            message: Cow::Owned(self.0.to_string()),
        }));
        (status, body).into_response()
    }
}

pub(crate) type WebResult<T> = std::result::Result<T, WebError>;
