use std::collections::{HashMap, HashSet};

use crate::{
    authentication::permissions::ActionType,
    config::Bounds,
    error::{NotFoundError, QueryError, ValidationError},
    jwt::SessionData,
    schema::{Recipe, RecipeDetail, RecipeFilter, RecipeForm, RecipePart, RecipeRow, Uuid},
    validation::validate_recipe_form,
};

use super::tags::list_recipe_tags;

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

/// Pushes the select list of a [`RecipeRow`]. The caller specific flags are
/// computed against `viewer`; anonymous callers see them all as false.
fn push_recipe_select(query: &mut QueryBuilder<'_, Postgres>, viewer: Option<Uuid>) {
    query.push(
        "
        SELECT r.id, r.name, r.text, r.image, r.cooking_time,
            EXISTS (SELECT 1 FROM favorites fa WHERE fa.recipe_id = r.id AND fa.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS is_favorited,
            EXISTS (SELECT 1 FROM shopping_cart sc WHERE sc.recipe_id = r.id AND sc.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS is_in_shopping_cart,
            u.id AS author_id,
            u.email AS author_email,
            u.username AS author_username,
            u.first_name AS author_first_name,
            u.last_name AS author_last_name,
            EXISTS (SELECT 1 FROM follows fo WHERE fo.author_id = u.id AND fo.follower_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS author_is_subscribed
        FROM recipes r
        INNER JOIN users u ON u.id = r.author_id
        WHERE TRUE",
    );
}

pub async fn list_recipes(
    filter: &RecipeFilter,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeDetail>, potion::Error> {
    if filter.is_favorited {
        ActionType::ManageOwnFavorites.authorize(viewer)?;
    }
    if filter.is_in_shopping_cart {
        ActionType::ManageOwnShoppingCart.authorize(viewer)?;
    }

    let viewer = viewer.map(|s| s.user_id);
    let mut query = QueryBuilder::new("");
    push_recipe_select(&mut query, viewer);

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS (
                SELECT 1 FROM recipe_tags rt
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if filter.is_favorited {
        query
            .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(viewer)
            .push(")");
    }
    if filter.is_in_shopping_cart {
        query
            .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
            .push_bind(viewer)
            .push(")");
    }
    query.push(" ORDER BY r.pub_date DESC, r.id DESC");

    let rows: Vec<RecipeRow> = query
        .build_query_as::<RecipeRow>()
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    assemble_recipes(rows, pool).await
}

async fn assemble_recipes(
    rows: Vec<RecipeRow>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeDetail>, potion::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut parts = list_recipe_parts(&ids, pool).await?;
    let mut tags = list_recipe_tags(&ids, pool).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let ingredients = parts.remove(&row.id).unwrap_or_default();
            let tags = tags.remove(&row.id).unwrap_or_default();
            RecipeDetail::from_row(row, ingredients, tags)
        })
        .collect())
}

/// Ingredient lines of every recipe in `recipe_ids`, keyed by recipe.
pub async fn list_recipe_parts(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, Vec<RecipePart>>, potion::Error> {
    let rows: Vec<RecipePart> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY i.name
    ")
    .bind(recipe_ids)
    .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    let mut hashmap: HashMap<Uuid, Vec<RecipePart>> = HashMap::new();
    rows.into_iter()
        .for_each(|x| match hashmap.get_mut(&x.recipe_id) {
            Some(v) => v.push(x),
            None => {
                hashmap.insert(x.recipe_id, vec![x]);
            }
        });

    Ok(hashmap)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<Recipe> = sqlx::query_as(
        "SELECT id, author_id, name, text, image, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_recipe_detail(
    id: Uuid,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, potion::Error> {
    let mut query = QueryBuilder::new("");
    push_recipe_select(&mut query, viewer.map(|s| s.user_id));
    query.push(" AND r.id = ").push_bind(id);

    let row: Option<RecipeRow> = query
        .build_query_as::<RecipeRow>()
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let row = row.ok_or_else(|| NotFoundError::new("No recipe exists with specified id").into())?;
    assemble_recipes(vec![row], pool)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| NotFoundError::new("No recipe exists with specified id").into())
}

/// Loads a recipe for modification: 404 when it does not exist, 403 when
/// the caller is not its author.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, potion::Error> {
    let recipe = get_recipe(id, pool).await?;

    match recipe {
        Some(recipe) => {
            session.authenticate_author(recipe.author_id)?;
            Ok(recipe)
        }
        None => Err(NotFoundError::new("No recipe exists with specified id").into()),
    }
}

/// Validates that every referenced tag and ingredient exists.
async fn check_references(form: &RecipeForm, conn: &mut PgConnection) -> Result<(), potion::Error> {
    let tags: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(&form.tags)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    let tags: HashSet<Uuid> = tags.into_iter().map(|t| t.0).collect();
    if let Some(missing) = form.tags.iter().find(|id| !tags.contains(id)) {
        return Err(ValidationError::field("tags", &format!("Tag {missing} does not exist")).into());
    }

    let ids: Vec<Uuid> = form.ingredients.iter().map(|i| i.id).collect();
    let ingredients: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    let ingredients: HashSet<Uuid> = ingredients.into_iter().map(|i| i.0).collect();
    if let Some(missing) = ids.iter().find(|id| !ingredients.contains(id)) {
        return Err(ValidationError::field(
            "ingredients",
            &format!("Ingredient {missing} does not exist"),
        )
        .into());
    }

    Ok(())
}

async fn set_recipe_tags(
    recipe_id: Uuid,
    tags: &[Uuid],
    conn: &mut PgConnection,
) -> Result<(), potion::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let mut query = QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query.push_values(tags.iter(), |mut b, tag| {
        b.push_bind(recipe_id).push_bind(*tag);
    });
    query
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

async fn set_recipe_ingredients(
    recipe_id: Uuid,
    form: &RecipeForm,
    conn: &mut PgConnection,
) -> Result<(), potion::Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let mut query =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query.push_values(form.ingredients.iter(), |mut b, ingredient| {
        b.push_bind(recipe_id)
            .push_bind(ingredient.id)
            .push_bind(ingredient.amount);
    });
    query
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Creates a recipe authored by the caller. The recipe row, its tags and
/// its ingredient lines are written in one transaction.
pub async fn create_recipe(
    form: &RecipeForm,
    session: Option<&SessionData>,
    bounds: &Bounds,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, potion::Error> {
    let session = ActionType::CreateRecipes.authorize(session)?;
    validate_recipe_form(form, bounds).map_err(|e| e.into())?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    check_references(form, &mut tr).await?;

    let recipe: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(form.name.trim())
    .bind(&form.text)
    .bind(form.image.clone().unwrap_or_default())
    .bind(form.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;
    let recipe_id = recipe.0;

    set_recipe_tags(recipe_id, &form.tags, &mut tr).await?;
    set_recipe_ingredients(recipe_id, form, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    log::info!("{} created recipe {}", session.username, recipe_id);
    get_recipe_detail(recipe_id, Some(session), pool).await
}

/// Replaces a recipe's tags, ingredient lines and fields in one
/// transaction. A missing image keeps the stored one.
pub async fn update_recipe(
    id: Uuid,
    form: &RecipeForm,
    session: Option<&SessionData>,
    bounds: &Bounds,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, potion::Error> {
    let session = ActionType::ManageOwnRecipes.authorize(session)?;
    get_recipe_mut(id, session, pool).await?;
    validate_recipe_form(form, bounds).map_err(|e| e.into())?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let locked: Option<(Uuid,)> =
        sqlx::query_as("SELECT author_id FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    match locked {
        Some((author_id,)) => session.authenticate_author(author_id)?,
        None => return Err(NotFoundError::new("No recipe exists with specified id").into()),
    }

    check_references(form, &mut tr).await?;
    set_recipe_tags(id, &form.tags, &mut tr).await?;
    set_recipe_ingredients(id, form, &mut tr).await?;

    sqlx::query(
        "
        UPDATE recipes
        SET name = $1, text = $2, image = COALESCE($3, image), cooking_time = $4
        WHERE id = $5
    ",
    )
    .bind(form.name.trim())
    .bind(&form.text)
    .bind(form.image.clone())
    .bind(form.cooking_time)
    .bind(id)
    .execute(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    log::info!("{} updated recipe {}", session.username, id);
    get_recipe_detail(id, Some(session), pool).await
}

/// Deletes a recipe. Ingredient lines, tag links, favorites and cart entries
/// go with it through the schema's cascades.
pub async fn delete_recipe(
    id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let session = ActionType::ManageOwnRecipes.authorize(session)?;
    let recipe = get_recipe_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    log::info!("{} deleted recipe {}", session.username, id);
    Ok(())
}
