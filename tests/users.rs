mod common;

use common::{expect_err, expect_ok, ingredient, tag, unique, user};
use foodgram_sdk::{
    create_ingredient, create_tag, cryptography::verify_password, get_ingredient, get_me, get_tag, get_user,
    get_user_profile, list_ingredients, list_tags, list_users, register_user,
    schema::{IngredientRecord, NewTag, NewUser, PasswordChange},
    set_password,
};

fn new_user(username: &str) -> NewUser {
    NewUser {
        email: format!("{username}@example.com"),
        username: username.to_owned(),
        first_name: String::from("Anna"),
        last_name: String::from("Baker"),
        password: String::from("correct horse"),
    }
}

#[tokio::test]
async fn registration_hashes_and_rejects_duplicates() {
    let Some(pool) = common::pool().await else { return };
    let username = unique("u");

    let created = expect_ok(register_user(&new_user(&username), &pool).await);
    assert_ne!(created.password, "correct horse");
    assert!(verify_password("correct horse", &created.password).unwrap());

    assert_eq!(expect_err(register_user(&new_user(&username), &pool).await), 400);

    let mut taken_email = new_user(&unique("u"));
    taken_email.email = created.email.clone();
    assert_eq!(expect_err(register_user(&taken_email, &pool).await), 400);

    let mut malformed = new_user("no spaces allowed");
    malformed.email = format!("{}@example.com", unique("m"));
    assert_eq!(expect_err(register_user(&malformed, &pool).await), 400);

    let stored = expect_ok(get_user(&pool, &username).await);
    assert_eq!(stored.map(|u| u.id), Some(created.id));
}

#[tokio::test]
async fn profiles_show_the_subscription_state() {
    let Some(pool) = common::pool().await else { return };
    let me = user(&pool).await;
    let other = user(&pool).await;

    let profile = expect_ok(get_user_profile(other.user_id, Some(&me), &pool).await);
    assert_eq!(profile.username, other.username);
    assert!(!profile.is_subscribed);
    assert_eq!(expect_err(get_user_profile(-1, Some(&me), &pool).await), 404);
    assert_eq!(expect_err(get_user_profile(other.user_id, None, &pool).await), 401);

    let mine = expect_ok(get_me(Some(&me), &pool).await);
    assert_eq!(mine.id, me.user_id);
    assert_eq!(expect_err(get_me(None, &pool).await), 401);

    let everyone = expect_ok(list_users(None, &pool).await);
    assert!(everyone.iter().any(|u| u.id == me.user_id));
    assert!(everyone.iter().all(|u| !u.is_subscribed));
}

#[tokio::test]
async fn password_change_verifies_the_current_password() {
    let Some(pool) = common::pool().await else { return };
    let me = user(&pool).await;

    let wrong = PasswordChange {
        current_password: String::from("battery staple"),
        new_password: String::from("new secret"),
    };
    assert_eq!(expect_err(set_password(&wrong, Some(&me), &pool).await), 400);

    let right = PasswordChange {
        current_password: String::from("correct horse"),
        new_password: String::from("new secret"),
    };
    expect_ok(set_password(&right, Some(&me), &pool).await);

    let stored = expect_ok(get_user(&pool, &me.username).await).unwrap();
    assert!(verify_password("new secret", &stored.password).unwrap());
    assert!(!verify_password("correct horse", &stored.password).unwrap());
}

#[tokio::test]
async fn tags_are_unique_and_listed_by_name() {
    let Some(pool) = common::pool().await else { return };
    let created = tag(&pool).await;

    assert_eq!(created.color, created.color.to_uppercase());
    assert_eq!(expect_ok(get_tag(created.id, &pool).await), Some(created.clone()));
    assert!(expect_ok(list_tags(&pool).await).contains(&created));

    let duplicate = NewTag {
        name: unique("t"),
        color: String::from("#000000"),
        slug: created.slug.clone(),
    };
    assert_eq!(expect_err(create_tag(&duplicate, &pool).await), 400);

    let malformed = NewTag {
        name: unique("t"),
        color: String::from("orange"),
        slug: unique("t"),
    };
    assert_eq!(expect_err(create_tag(&malformed, &pool).await), 400);
}

#[tokio::test]
async fn ingredient_search_is_a_case_insensitive_prefix_match() {
    let Some(pool) = common::pool().await else { return };
    let created = ingredient(&pool, "Flour", "g").await;

    assert_eq!(expect_ok(get_ingredient(created.id, &pool).await), Some(created.clone()));

    let prefix = created.name.to_lowercase();
    let found = expect_ok(list_ingredients(Some(prefix.as_str()), &pool).await);
    assert_eq!(found, vec![created.clone()]);

    let suffix = &created.name[6..];
    assert!(expect_ok(list_ingredients(Some(suffix), &pool).await).is_empty());
    assert!(expect_ok(list_ingredients(Some("%"), &pool).await)
        .iter()
        .all(|i| i.name.starts_with('%')));
}

#[tokio::test]
async fn over_long_ingredient_fields_are_client_errors() {
    let Some(pool) = common::pool().await else { return };

    let long_name = IngredientRecord {
        name: "a".repeat(201),
        measurement_unit: String::from("g"),
    };
    assert_eq!(expect_err(create_ingredient(&long_name, &pool).await), 400);

    let long_unit = IngredientRecord {
        name: unique("salt"),
        measurement_unit: "g".repeat(51),
    };
    assert_eq!(expect_err(create_ingredient(&long_unit, &pool).await), 400);
}
