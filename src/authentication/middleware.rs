use std::{convert::Infallible, sync::Arc};

use sqlx::{Pool, Postgres};
use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::{config::Config, constants::SESSION_SCHEMES};

use super::jwt::{verify_jwt_session, SessionData};

#[derive(Debug)]
pub struct Unauthorized {
    pub info: &'static str,
}

impl reject::Reject for Unauthorized {}

/// Extracts the token from `Authorization: Bearer <token>` (or `Token <token>`).
pub fn session_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if token.is_empty() || !SESSION_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return None;
    }
    Some(token)
}

fn read_session(header: Option<&str>, config: &Config) -> Result<SessionData, Unauthorized> {
    let header = header.ok_or(Unauthorized {
        info: "Authentication credentials were not provided",
    })?;
    let token = session_token(header).ok_or(Unauthorized {
        info: "Invalid authorization header",
    })?;

    verify_jwt_session(token, &config.jwt_secret)
        .map(SessionData::from)
        .map_err(|_| Unauthorized {
            info: "Invalid session",
        })
}

pub fn with_session(
    config: Arc<Config>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let config = config.clone();
        async move {
            read_session(header.as_deref(), &config).map_err(reject::custom)
        }
    })
}

/// Like [`with_session`], but anonymous or invalid credentials yield `None`
/// instead of a rejection. Used by the public read endpoints.
pub fn with_possible_session(
    config: Arc<Config>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(move |header: Option<String>| {
        header
            .as_deref()
            .and_then(|header| read_session(Some(header), &config).ok())
    })
}

pub fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

pub fn with_config(
    config: Arc<Config>,
) -> impl Filter<Extract = (Arc<Config>,), Error = Infallible> + Clone {
    warp::any().map(move || config.clone())
}
