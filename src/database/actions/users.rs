use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        permissions::ActionType,
    },
    error::{NotFoundError, QueryError, ValidationError},
    jwt::SessionData,
    schema::{NewUser, PasswordChange, User, UserView, Uuid},
    validation::{validate_new_user, validate_password},
};

use sqlx::{Pool, Postgres};

/// Columns of a [`UserView`] for alias `u`, with `$1` bound to the viewer id.
pub(crate) const USER_VIEW_COLUMNS: &str = "
    u.id, u.email, u.username, u.first_name, u.last_name,
    EXISTS (SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.author_id = u.id) AS is_subscribed
";

pub async fn get_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<User>, potion::Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, potion::Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates a user; the stored password is an argon2 hash.
pub async fn register_user(new_user: &NewUser, pool: &Pool<Postgres>) -> Result<User, potion::Error> {
    validate_new_user(new_user).map_err(|e| e.into())?;

    let password = hash_password(&new_user.password)
        .map_err(|e| QueryError::new(format!("Failed to hash password: {e}")).into())?;

    let user: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match user {
        Some(user) => {
            log::info!("Registered user {} ({})", user.username, user.id);
            Ok(user)
        }
        None => Err(ValidationError::new("A user with that username or email already exists").into()),
    }
}

pub async fn list_users(
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Vec<UserView>, potion::Error> {
    let rows: Vec<UserView> =
        sqlx::query_as(&format!("SELECT {USER_VIEW_COLUMNS} FROM users u ORDER BY u.id"))
            .bind(viewer.map(|s| s.user_id))
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub(crate) async fn find_user_view(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserView>, potion::Error> {
    let row: Option<UserView> =
        sqlx::query_as(&format!("SELECT {USER_VIEW_COLUMNS} FROM users u WHERE u.id = $2"))
            .bind(viewer)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_profile(
    id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<UserView, potion::Error> {
    let session = ActionType::ViewProfiles.authorize(session)?;

    find_user_view(id, Some(session.user_id), pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No user exists with specified id").into())
}

pub async fn get_me(
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<UserView, potion::Error> {
    let session = ActionType::ManageOwnAccount.authorize(session)?;

    find_user_view(session.user_id, Some(session.user_id), pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No user exists with specified id").into())
}

pub async fn set_password(
    change: &PasswordChange,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let session = ActionType::ManageOwnAccount.authorize(session)?;
    validate_password(&change.new_password).map_err(|e| e.into())?;

    let user = get_user_by_id(pool, session.user_id)
        .await?
        .ok_or_else(|| NotFoundError::new("No user exists with specified id").into())?;

    let authenticated = verify_password(&change.current_password, &user.password)
        .map_err(|e| QueryError::new(format!("Stored password hash is invalid: {e}")).into())?;
    if !authenticated {
        return Err(ValidationError::field("current_password", "Invalid password").into());
    }

    let password = hash_password(&change.new_password)
        .map_err(|e| QueryError::new(format!("Failed to hash password: {e}")).into())?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user.id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}
