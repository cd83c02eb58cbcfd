use crate::{
    authentication::permissions::ActionType,
    error::{NotFoundError, QueryError, ValidationError},
    jwt::SessionData,
    schema::{RecipeShort, Uuid},
};

use super::recipes::get_recipe;

use sqlx::{Pool, Postgres};

/// Marks a recipe as a favorite of the caller and returns its short form.
pub async fn add_to_favorites(
    recipe_id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeShort, potion::Error> {
    let session = ActionType::ManageOwnFavorites.authorize(session)?;
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No recipe exists with specified id").into())?;

    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(recipe.id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ValidationError::new("Recipe is already in favorites").into());
    }

    log::debug!("{} added recipe {} to favorites", session.username, recipe.id);
    Ok(recipe.into())
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let session = ActionType::ManageOwnFavorites.authorize(session)?;

    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(session.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::new("Recipe is not in favorites").into());
    }

    log::debug!("{} removed recipe {} from favorites", session.username, recipe_id);
    Ok(())
}
