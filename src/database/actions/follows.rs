use std::collections::HashMap;

use crate::{
    authentication::permissions::ActionType,
    error::{NotFoundError, QueryError, ValidationError},
    jwt::SessionData,
    schema::{AuthorView, LinkedRecipeShort, RecipeShort, UserView, Uuid},
    validation::validate_follow,
};

use super::users::{find_user_view, USER_VIEW_COLUMNS};

use sqlx::{Pool, Postgres};

fn check_recipes_limit(recipes_limit: Option<i64>) -> Result<(), potion::Error> {
    match recipes_limit {
        Some(limit) if limit < 0 => {
            Err(ValidationError::field("recipes_limit", "Must not be negative").into())
        }
        _ => Ok(()),
    }
}

/// Attaches the newest recipes (up to `recipes_limit`, all when `None`) and
/// the recipe count to every author.
async fn author_views(
    authors: Vec<UserView>,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<AuthorView>, potion::Error> {
    let ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();

    let rows: Vec<LinkedRecipeShort> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time FROM (
            SELECT r.author_id, r.id, r.name, r.image, r.cooking_time,
                ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE $2::BIGINT IS NULL OR position <= $2
        ORDER BY author_id, position
    ",
    )
    .bind(&ids)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let counts: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;
    let counts: HashMap<Uuid, i64> = counts.into_iter().collect();

    let mut recipes: HashMap<Uuid, Vec<RecipeShort>> = HashMap::new();
    rows.into_iter()
        .for_each(|x| match recipes.get_mut(&x.author_id) {
            Some(v) => v.push(x.into()),
            None => {
                recipes.insert(x.author_id, vec![x.into()]);
            }
        });

    Ok(authors
        .into_iter()
        .map(|user| AuthorView {
            recipes: recipes.remove(&user.id).unwrap_or_default(),
            recipes_count: counts.get(&user.id).copied().unwrap_or(0),
            user,
        })
        .collect())
}

/// Follows `author_id`. Self-follows are rejected before anything is read
/// or written.
pub async fn subscribe(
    author_id: Uuid,
    session: Option<&SessionData>,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<AuthorView, potion::Error> {
    let session = ActionType::ManageOwnSubscriptions.authorize(session)?;
    validate_follow(session.user_id, author_id).map_err(|e| e.into())?;
    check_recipes_limit(recipes_limit)?;

    if find_user_view(author_id, None, pool).await?.is_none() {
        return Err(NotFoundError::new("No user exists with specified id").into());
    }

    let result = sqlx::query(
        "INSERT INTO follows (follower_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ValidationError::new("Already subscribed to this author").into());
    }
    log::debug!("{} subscribed to {}", session.username, author_id);

    let author = find_user_view(author_id, Some(session.user_id), pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No user exists with specified id").into())?;

    author_views(vec![author], recipes_limit, pool)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| NotFoundError::new("No user exists with specified id").into())
}

/// Unfollows `author_id`. Not following the author is a client error.
pub async fn unsubscribe(
    author_id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let session = ActionType::ManageOwnSubscriptions.authorize(session)?;

    if find_user_view(author_id, None, pool).await?.is_none() {
        return Err(NotFoundError::new("No user exists with specified id").into());
    }

    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ValidationError::new("Not subscribed to this author").into());
    }

    log::debug!("{} unsubscribed from {}", session.username, author_id);
    Ok(())
}

/// Authors the caller follows, ordered by username.
pub async fn list_subscriptions(
    session: Option<&SessionData>,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<AuthorView>, potion::Error> {
    let session = ActionType::ManageOwnSubscriptions.authorize(session)?;
    check_recipes_limit(recipes_limit)?;

    let authors: Vec<UserView> = sqlx::query_as(&format!(
        "
        SELECT {USER_VIEW_COLUMNS}
        FROM follows fo
        INNER JOIN users u ON u.id = fo.author_id
        WHERE fo.follower_id = $1
        ORDER BY u.username
    "
    ))
    .bind(session.user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    author_views(authors, recipes_limit, pool).await
}
