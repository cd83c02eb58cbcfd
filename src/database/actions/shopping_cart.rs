use crate::{
    authentication::permissions::ActionType,
    error::{NotFoundError, QueryError, ValidationError},
    jwt::SessionData,
    schema::{RecipePart, RecipeShort, ShoppingListItem, Uuid},
    shopping_list::{aggregate, render},
};

use super::recipes::get_recipe;

use sqlx::{Pool, Postgres};

pub async fn add_to_shopping_cart(
    recipe_id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeShort, potion::Error> {
    let session = ActionType::ManageOwnShoppingCart.authorize(session)?;
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No recipe exists with specified id").into())?;

    let result = sqlx::query(
        "INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(recipe.id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ValidationError::new("Recipe is already in the shopping cart").into());
    }

    log::debug!("{} added recipe {} to the cart", session.username, recipe.id);
    Ok(recipe.into())
}

pub async fn remove_from_shopping_cart(
    recipe_id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let session = ActionType::ManageOwnShoppingCart.authorize(session)?;

    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(session.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::new("Recipe is not in the shopping cart").into());
    }

    log::debug!("{} removed recipe {} from the cart", session.username, recipe_id);
    Ok(())
}

/// Summed ingredient lines of every recipe in the caller's cart.
pub async fn shopping_list_items(
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, potion::Error> {
    let session = ActionType::ManageOwnShoppingCart.authorize(session)?;

    let parts: Vec<RecipePart> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
    ")
    .bind(session.user_id)
    .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    Ok(aggregate(parts))
}

/// The caller's shopping list as a plain text document.
pub async fn download_shopping_cart(
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<String, potion::Error> {
    let items = shopping_list_items(session, pool).await?;
    Ok(render(&items))
}
