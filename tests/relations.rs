mod common;

use common::{expect_err, expect_ok, ingredient, recipe, user};
use foodgram_sdk::{
    add_to_favorites, add_to_shopping_cart, get_recipe_detail, get_user_profile,
    list_subscriptions, remove_from_favorites, remove_from_shopping_cart, subscribe, unsubscribe,
};
use sqlx::{Pool, Postgres};

async fn count(pool: &Pool<Postgres>, query: &str, a: i32, b: i32) -> i64 {
    let row: (i64,) = sqlx::query_as(query)
        .bind(a)
        .bind(b)
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

/// Error codes of two racing calls, successes first.
fn outcomes<A, B>(
    first: Result<A, potion::Error>,
    second: Result<B, potion::Error>,
) -> Vec<Option<i64>> {
    let mut codes = vec![
        first.err().map(|e| e.code as i64),
        second.err().map(|e| e.code as i64),
    ];
    codes.sort();
    codes
}

#[tokio::test]
async fn favoriting_twice_keeps_one_row() {
    let Some(pool) = common::pool().await else { return };
    let author = user(&pool).await;
    let reader = user(&pool).await;
    let flour = ingredient(&pool, "flour", "g").await;
    let created = recipe(&pool, &author, &[(flour.id, 100)]).await;

    let short = expect_ok(add_to_favorites(created.id, Some(&reader), &pool).await);
    assert_eq!(short.id, created.id);
    assert_eq!(short.name, created.name);

    assert_eq!(expect_err(add_to_favorites(created.id, Some(&reader), &pool).await), 400);
    let rows = count(
        &pool,
        "SELECT COUNT(*) FROM favorites WHERE user_id = $1 AND recipe_id = $2",
        reader.user_id,
        created.id,
    )
    .await;
    assert_eq!(rows, 1);

    let detail = expect_ok(get_recipe_detail(created.id, Some(&reader), &pool).await);
    assert!(detail.is_favorited);

    expect_ok(remove_from_favorites(created.id, Some(&reader), &pool).await);
    assert_eq!(expect_err(remove_from_favorites(created.id, Some(&reader), &pool).await), 404);
}

#[tokio::test]
async fn relations_require_authentication_and_an_existing_recipe() {
    let Some(pool) = common::pool().await else { return };
    let author = user(&pool).await;
    let flour = ingredient(&pool, "flour", "g").await;
    let created = recipe(&pool, &author, &[(flour.id, 100)]).await;

    assert_eq!(expect_err(add_to_favorites(created.id, None, &pool).await), 401);
    assert_eq!(expect_err(add_to_shopping_cart(created.id, None, &pool).await), 401);
    assert_eq!(expect_err(subscribe(author.user_id, None, None, &pool).await), 401);

    assert_eq!(expect_err(add_to_favorites(-1, Some(&author), &pool).await), 404);
    assert_eq!(expect_err(add_to_shopping_cart(-1, Some(&author), &pool).await), 404);
}

#[tokio::test]
async fn shopping_cart_rejects_duplicates_and_missing_entries() {
    let Some(pool) = common::pool().await else { return };
    let author = user(&pool).await;
    let flour = ingredient(&pool, "flour", "g").await;
    let created = recipe(&pool, &author, &[(flour.id, 100)]).await;

    expect_ok(add_to_shopping_cart(created.id, Some(&author), &pool).await);
    assert_eq!(expect_err(add_to_shopping_cart(created.id, Some(&author), &pool).await), 400);

    let detail = expect_ok(get_recipe_detail(created.id, Some(&author), &pool).await);
    assert!(detail.is_in_shopping_cart);

    expect_ok(remove_from_shopping_cart(created.id, Some(&author), &pool).await);
    assert_eq!(
        expect_err(remove_from_shopping_cart(created.id, Some(&author), &pool).await),
        404
    );
}

#[tokio::test]
async fn self_follow_is_rejected_without_a_row() {
    let Some(pool) = common::pool().await else { return };
    let me = user(&pool).await;

    assert_eq!(expect_err(subscribe(me.user_id, Some(&me), None, &pool).await), 400);

    let rows = count(
        &pool,
        "SELECT COUNT(*) FROM follows WHERE follower_id = $1 AND author_id = $2",
        me.user_id,
        me.user_id,
    )
    .await;
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn follow_lifecycle() {
    let Some(pool) = common::pool().await else { return };
    let author = user(&pool).await;
    let follower = user(&pool).await;
    let flour = ingredient(&pool, "flour", "g").await;
    let older = recipe(&pool, &author, &[(flour.id, 100)]).await;
    let newer = recipe(&pool, &author, &[(flour.id, 200)]).await;

    let view = expect_ok(subscribe(author.user_id, Some(&follower), Some(1), &pool).await);
    assert!(view.user.is_subscribed);
    assert_eq!(view.recipes_count, 2);
    assert_eq!(view.recipes.len(), 1);
    assert_eq!(view.recipes[0].id, newer.id);

    assert_eq!(
        expect_err(subscribe(author.user_id, Some(&follower), None, &pool).await),
        400
    );
    assert_eq!(expect_err(subscribe(-1, Some(&follower), None, &pool).await), 404);

    let subscriptions = expect_ok(list_subscriptions(Some(&follower), None, &pool).await);
    assert_eq!(subscriptions.len(), 1);
    let ids: Vec<_> = subscriptions[0].recipes.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let profile = expect_ok(get_user_profile(author.user_id, Some(&follower), &pool).await);
    assert!(profile.is_subscribed);

    expect_ok(unsubscribe(author.user_id, Some(&follower), &pool).await);
    assert_eq!(expect_err(unsubscribe(author.user_id, Some(&follower), &pool).await), 400);
    assert!(expect_ok(list_subscriptions(Some(&follower), None, &pool).await).is_empty());
}

#[tokio::test]
async fn concurrent_favorites_store_one_row() {
    let Some(pool) = common::pool().await else { return };
    let author = user(&pool).await;
    let reader = user(&pool).await;
    let flour = ingredient(&pool, "flour", "g").await;
    let created = recipe(&pool, &author, &[(flour.id, 100)]).await;

    let (first, second) = tokio::join!(
        add_to_favorites(created.id, Some(&reader), &pool),
        add_to_favorites(created.id, Some(&reader), &pool),
    );

    let codes = outcomes(first, second);
    assert_eq!(codes, vec![None, Some(400)]);
    let rows = count(
        &pool,
        "SELECT COUNT(*) FROM favorites WHERE user_id = $1 AND recipe_id = $2",
        reader.user_id,
        created.id,
    )
    .await;
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn concurrent_cart_additions_store_one_row() {
    let Some(pool) = common::pool().await else { return };
    let author = user(&pool).await;
    let flour = ingredient(&pool, "flour", "g").await;
    let created = recipe(&pool, &author, &[(flour.id, 100)]).await;

    let (first, second) = tokio::join!(
        add_to_shopping_cart(created.id, Some(&author), &pool),
        add_to_shopping_cart(created.id, Some(&author), &pool),
    );

    assert_eq!(outcomes(first, second), vec![None, Some(400)]);
    let rows = count(
        &pool,
        "SELECT COUNT(*) FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2",
        author.user_id,
        created.id,
    )
    .await;
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn concurrent_subscriptions_store_one_row() {
    let Some(pool) = common::pool().await else { return };
    let author = user(&pool).await;
    let follower = user(&pool).await;

    let (first, second) = tokio::join!(
        subscribe(author.user_id, Some(&follower), None, &pool),
        subscribe(author.user_id, Some(&follower), None, &pool),
    );

    assert_eq!(outcomes(first, second), vec![None, Some(400)]);
    let rows = count(
        &pool,
        "SELECT COUNT(*) FROM follows WHERE follower_id = $1 AND author_id = $2",
        follower.user_id,
        author.user_id,
    )
    .await;
    assert_eq!(rows, 1);
}
