use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, SessionData, SessionKey},
        permissions::ActionType,
    },
    error::ApiError,
    pagination::{Page, PageRequest},
    schema::{Id, NewUser, User, UserRow, UserView},
    MAX_LEN_EMAIL, MAX_LEN_USERNAME, MAX_LEN_USER_NAME_PART,
};

use std::sync::LazyLock;

use regex::Regex;
use sqlx::{Pool, Postgres};

use super::is_subscribed;

static RE_NOT_CYRILLIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^а-яёА-ЯЁ]").unwrap());
static RE_NOT_LATIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z]").unwrap());
static RE_NAME_NOT_CYRILLIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^а-яёА-ЯЁ -]").unwrap());
static RE_NAME_NOT_LATIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z -]").unwrap());

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::validation(
            field,
            &format!("Must be {min}..={max} characters"),
        ));
    }
    Ok(())
}

/// A value fails when it has characters outside both alphabets, i.e. it
/// mixes scripts or carries something that is in neither.
fn check_single_script(
    field: &str,
    value: &str,
    not_cyrillic: &Regex,
    not_latin: &Regex,
) -> Result<(), ApiError> {
    if not_cyrillic.is_match(value) && not_latin.is_match(value) {
        return Err(ApiError::validation(
            field,
            &format!("<{value}> mixes alphabets or contains more than letters"),
        ));
    }
    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ApiError> {
    check_length("email", &user.email, 3, MAX_LEN_EMAIL)?;
    if !user.email.contains('@') {
        return Err(ApiError::validation("email", "Enter a valid email address"));
    }

    check_length("username", &user.username, 1, MAX_LEN_USERNAME)?;
    if !user
        .username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(ApiError::validation(
            "username",
            "Letters, digits and @/./+/-/_ only",
        ));
    }

    check_single_script("username", &user.username, &RE_NOT_CYRILLIC, &RE_NOT_LATIN)?;

    check_length("first_name", &user.first_name, 1, MAX_LEN_USER_NAME_PART)?;
    check_single_script(
        "first_name",
        &user.first_name,
        &RE_NAME_NOT_CYRILLIC,
        &RE_NAME_NOT_LATIN,
    )?;
    check_length("last_name", &user.last_name, 1, MAX_LEN_USER_NAME_PART)?;
    check_single_script(
        "last_name",
        &user.last_name,
        &RE_NAME_NOT_CYRILLIC,
        &RE_NAME_NOT_LATIN,
    )?;

    if user.password.is_empty() {
        return Err(ApiError::validation("password", "This field is required"));
    }
    Ok(())
}

/// Creates a user; the password is stored as an argon2 hash
pub async fn register_user(new_user: NewUser, pool: &Pool<Postgres>) -> Result<User, ApiError> {
    validate_new_user(&new_user)?;
    let password = hash_password(&new_user.password)?;

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(new_user.email)
    .bind(new_user.username)
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(password)
    .fetch_one(pool)
    .await?;

    log::debug!("> Registered user {} ({})", user.id, user.username);
    Ok(user)
}

pub async fn login_user(
    email: &str,
    password: &str,
    key: &SessionKey,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(pool, email)
        .await?
        .ok_or_else(|| ApiError::validation("credentials", "Invalid credentials"))?;

    if !verify_password(password, &user.password)? {
        return Err(ApiError::validation("credentials", "Invalid credentials"));
    }
    if !user.is_active {
        return Err(ApiError::validation("credentials", "User account is disabled"));
    }

    generate_jwt_session(&user, key)
}

pub async fn set_password(
    current_password: &str,
    new_password: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    session.authenticate(ActionType::ManageOwnAccount)?;
    let user = get_user_by_id(pool, session.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if !verify_password(current_password, &user.password)? {
        return Err(ApiError::validation("current_password", "Invalid password"));
    }
    if new_password.is_empty() {
        return Err(ApiError::validation("new_password", "This field is required"));
    }

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(hash_password(new_password)?)
        .bind(user.id)
        .execute(pool)
        .await?;

    Ok(())
}

/// `is_subscribed` is false for anonymous viewers and for the user themself.
pub async fn fetch_user_view(
    user_id: Id,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<UserView, ApiError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let subscribed = match viewer {
        Some(viewer) if viewer.user_id != user.id => {
            is_subscribed(viewer.user_id, user.id, pool).await?
        }
        _ => false,
    };

    Ok(UserView::from_user(user, subscribed))
}

/// Every user, ordered by username
pub async fn fetch_users(
    page: PageRequest,
    page_size: i64,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Page<UserView>, ApiError> {
    let page_size = page.page_size(page_size);

    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*,
            EXISTS (SELECT 1 FROM subscriptions s WHERE s.user_id = $1 AND s.author_id = u.id)
                AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(viewer.map(|viewer| viewer.user_id))
    .bind(page_size)
    .bind(page.offset(page_size))
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let views = rows
        .into_iter()
        .map(|row| UserView::from_user(row.user, row.is_subscribed))
        .collect();

    Ok(Page::from_rows(views, total_count, page_size, page.page))
}
