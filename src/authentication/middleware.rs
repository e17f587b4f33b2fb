use std::convert::Infallible;

use serde_json::json;
use warp::{http::StatusCode, reject::Rejection, Filter, Reply};

use crate::{error::ApiError, SESSION_COOKIE, TOKEN_PREFIX};

use super::jwt::{verify_jwt_session, SessionData, SessionKey};

/// `Authorization: Token <jwt>` wins over the session cookie.
fn session_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Copy {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .map(|cookie: Option<String>, header: Option<String>| {
            header
                .and_then(|header| header.strip_prefix(TOKEN_PREFIX).map(str::to_owned))
                .or(cookie)
        })
}

pub fn with_session(
    key: SessionKey,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    session_token().and_then(move |token: Option<String>| {
        let key = key.clone();
        async move {
            let token = token.ok_or_else(|| warp::reject::custom(ApiError::Unauthorized))?;

            verify_jwt_session(&token, &key)
                .map(SessionData::from)
                .map_err(warp::reject::custom)
        }
    })
}

/// Anonymous callers, and callers with an invalid token, get `None`.
pub fn with_possible_session(
    key: SessionKey,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    session_token().map(move |token: Option<String>| {
        token.and_then(|token| match verify_jwt_session(&token, &key) {
            Ok(data) => Some(SessionData::from(data)),
            Err(e) => {
                log::trace!("> Ignoring session: {e}");
                None
            }
        })
    })
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if let Some(e) = err.find::<ApiError>() {
        (e.status_code(), e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_owned())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned())
    } else {
        log::error!("> Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_owned(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "detail": detail })),
        status,
    ))
}
