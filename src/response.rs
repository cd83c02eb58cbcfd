//! Reply construction for the host service's handlers.
//!
//! Every endpoint answers with one [`Payload`] variant. [`respond`] picks the
//! status from the HTTP method and turns `potion::Error` into a JSON error
//! body, so handlers never build replies by hand.

use std::convert::Infallible;

use serde::Serialize;
use serde_json::json;
use warp::{
    http::{header, HeaderValue, Method, StatusCode},
    reject::Rejection,
    reply::{self, Reply, Response},
};

use crate::{
    constants::SHOPPING_LIST_FILENAME,
    middleware::Unauthorized,
    schema::{AuthorView, Ingredient, RecipeDetail, RecipeShort, Tag, UserView},
};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Payload {
    Recipes(Vec<RecipeDetail>),
    Recipe(RecipeDetail),
    RecipeShort(RecipeShort),
    Users(Vec<UserView>),
    User(UserView),
    Authors(Vec<AuthorView>),
    Author(AuthorView),
    Tags(Vec<Tag>),
    Tag(Tag),
    Ingredients(Vec<Ingredient>),
    Ingredient(Ingredient),
    #[serde(skip)]
    ShoppingList(String),
    #[serde(skip)]
    Empty,
}

impl Payload {
    pub fn into_response(self, status: StatusCode) -> Response {
        match self {
            Payload::ShoppingList(body) => shopping_list_reply(body),
            Payload::Empty => StatusCode::NO_CONTENT.into_response(),
            payload => reply::with_status(reply::json(&payload), status).into_response(),
        }
    }
}

pub fn respond(method: &Method, result: Result<Payload, potion::Error>) -> Response {
    match result {
        Ok(payload) => {
            let status = match *method {
                Method::POST => StatusCode::CREATED,
                Method::DELETE => StatusCode::NO_CONTENT,
                _ => StatusCode::OK,
            };
            payload.into_response(status)
        }
        Err(e) => error_reply(e),
    }
}

pub fn error_reply(error: potion::Error) -> Response {
    let status =
        StatusCode::from_u16(error.code as u16).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = json!({ "errors": error.info.unwrap_or_else(|| status.to_string()) });

    reply::with_status(reply::json(&body), status).into_response()
}

/// Plain-text attachment for the shopping list download.
pub fn shopping_list_reply(body: String) -> Response {
    let mut response = reply::with_header(
        body,
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8",
    )
    .into_response();

    let disposition = format!("attachment; filename={SHOPPING_LIST_FILENAME}");
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// Recovery for filter rejections; every rejection becomes a JSON error reply.
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, info) = if let Some(e) = rejection.find::<Unauthorized>() {
        (StatusCode::UNAUTHORIZED, e.info.to_owned())
    } else if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = rejection.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, String::from("Method not allowed"))
    } else {
        log::error!("Unhandled rejection: {rejection:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    Ok(reply::with_status(reply::json(&json!({ "errors": info })), status).into_response())
}
