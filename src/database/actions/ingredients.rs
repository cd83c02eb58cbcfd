use crate::{
    error::QueryError,
    schema::{Ingredient, IngredientRecord, Uuid},
    validation::validate_ingredient,
};

use sqlx::{Pool, Postgres};

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Ingredients whose name starts with `name` (case-insensitive), or all of
/// them when no query is given.
pub async fn list_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, potion::Error> {
    let rows: Vec<Ingredient> = match name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => sqlx::query_as(
            "SELECT * FROM ingredients WHERE LOWER(name) LIKE (LOWER($1) || '%') ORDER BY name, measurement_unit",
        )
        .bind(escape_like(name))
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?,
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY name, measurement_unit")
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?,
    };

    Ok(rows)
}

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, potion::Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Returns the existing row when the (name, unit) pair is already known.
pub async fn create_ingredient(
    record: &IngredientRecord,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, potion::Error> {
    validate_ingredient(record).map_err(|e| e.into())?;
    let name = record.name.trim();
    let unit = record.measurement_unit.trim();

    let row: Ingredient = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT (name, measurement_unit) DO UPDATE SET name = EXCLUDED.name
        RETURNING *
    ",
    )
    .bind(name)
    .bind(unit)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}
