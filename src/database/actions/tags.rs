use std::collections::HashMap;

use crate::{
    error::{QueryError, ValidationError},
    schema::{LinkedRecipeTag, NewTag, Tag, Uuid},
    validation::validate_new_tag,
};

use sqlx::{Pool, Postgres};

pub async fn create_tag(tag: &NewTag, pool: &Pool<Postgres>) -> Result<Tag, potion::Error> {
    validate_new_tag(tag).map_err(|e| e.into())?;

    let row: Option<Tag> = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING *",
    )
    .bind(&tag.name)
    .bind(tag.color.to_uppercase())
    .bind(&tag.slug)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    row.ok_or_else(|| {
        ValidationError::new("A tag with that name, color or slug already exists").into()
    })
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, potion::Error> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, potion::Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Tags of every recipe in `recipe_ids`, keyed by recipe.
pub async fn list_recipe_tags(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, Vec<Tag>>, potion::Error> {
    let rows: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let mut hashmap: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    rows.into_iter()
        .for_each(|x| match hashmap.get_mut(&x.recipe_id) {
            Some(v) => v.push(x.into()),
            None => {
                hashmap.insert(x.recipe_id, vec![x.into()]);
            }
        });

    Ok(hashmap)
}
