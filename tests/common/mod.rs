#![allow(dead_code)]

use foodgram_sdk::{
    connection::{connect, migrate},
    create_ingredient, create_recipe, create_tag,
    jwt::SessionData,
    register_user,
    schema::{Ingredient, IngredientAmount, IngredientRecord, NewTag, NewUser, RecipeDetail, RecipeForm, Tag, Uuid},
    Bounds, Config,
};
use sqlx::{Pool, Postgres};

/// Connects to `DATABASE_URL` and migrates it. Returns `None` when the
/// variable is unset so the calling test can skip itself.
pub async fn pool() -> Option<Pool<Postgres>> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL is not set, skipping");
            return None;
        }
    };

    let config = Config::with_database_url(&url);
    let pool = match connect(&config).await {
        Ok(pool) => pool,
        Err(e) => panic!("could not connect ({}): {:?}", e.code, e.info),
    };
    if let Err(e) = migrate(&pool).await {
        panic!("migration failed ({}): {:?}", e.code, e.info);
    }

    Some(pool)
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}{}", uuid::Uuid::new_v4().simple())
}

pub fn expect_ok<T>(result: Result<T, potion::Error>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("unexpected error {}: {:?}", e.code, e.info),
    }
}

/// The status code of a failed action.
pub fn expect_err<T>(result: Result<T, potion::Error>) -> u16 {
    match result {
        Ok(_) => panic!("expected an error"),
        Err(e) => e.code as u16,
    }
}

pub async fn user(pool: &Pool<Postgres>) -> SessionData {
    let username = unique("u");
    let user = expect_ok(
        register_user(
            &NewUser {
                email: format!("{username}@example.com"),
                username,
                first_name: String::from("Test"),
                last_name: String::from("User"),
                password: String::from("correct horse"),
            },
            pool,
        )
        .await,
    );

    SessionData {
        user_id: user.id,
        username: user.username,
    }
}

pub async fn tag(pool: &Pool<Postgres>) -> Tag {
    let slug = unique("t");
    let color = format!("#{}", &slug[1..7]);
    expect_ok(
        create_tag(
            &NewTag {
                name: slug.clone(),
                color,
                slug,
            },
            pool,
        )
        .await,
    )
}

pub async fn ingredient(pool: &Pool<Postgres>, name: &str, unit: &str) -> Ingredient {
    expect_ok(
        create_ingredient(
            &IngredientRecord {
                name: format!("{name} {}", unique("")),
                measurement_unit: unit.to_owned(),
            },
            pool,
        )
        .await,
    )
}

pub fn form(name: &str, ingredients: &[(Uuid, i32)], tags: &[Uuid]) -> RecipeForm {
    RecipeForm {
        name: name.to_owned(),
        text: String::from("Mix everything and bake."),
        image: Some(String::from("recipes/images/test.png")),
        cooking_time: 30,
        ingredients: ingredients
            .iter()
            .map(|(id, amount)| IngredientAmount {
                id: *id,
                amount: *amount,
            })
            .collect(),
        tags: tags.to_vec(),
    }
}

pub async fn recipe(
    pool: &Pool<Postgres>,
    author: &SessionData,
    ingredients: &[(Uuid, i32)],
) -> RecipeDetail {
    let tag = tag(pool).await;
    expect_ok(
        create_recipe(
            &form("Pancakes", ingredients, &[tag.id]),
            Some(author),
            &Bounds::default(),
            pool,
        )
        .await,
    )
}
