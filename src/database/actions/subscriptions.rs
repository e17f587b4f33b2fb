use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    jwt::SessionData,
    pagination::{Page, PageRequest},
    schema::{Id, RecipeShort, SubscriptionRow, SubscriptionView, User, UserView},
};

use super::get_user_by_id;

pub async fn is_subscribed(
    user_id: Id,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE user_id = $1 AND author_id = $2)",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn count_author_recipes(author_id: Id, pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Newest recipes of an author, at most `limit`
pub async fn list_author_recipes(
    author_id: Id,
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeShort>, ApiError> {
    let rows: Vec<RecipeShort> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC, id DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// `None` means no limit
pub fn check_recipes_limit(limit: Option<i64>) -> Result<Option<i64>, ApiError> {
    match limit {
        Some(limit) if limit < 0 => Err(ApiError::validation(
            "recipes_limit",
            "Must be a non-negative integer",
        )),
        limit => Ok(limit),
    }
}

async fn subscription_view(
    author: User,
    recipes_count: i64,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, ApiError> {
    let recipes = list_author_recipes(author.id, recipes_limit, pool).await?;

    Ok(SubscriptionView {
        author: UserView::from_user(author, true),
        recipes,
        recipes_count,
    })
}

pub async fn subscribe(
    author_id: Id,
    recipes_limit: Option<i64>,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let recipes_limit = check_recipes_limit(recipes_limit)?;

    if author_id == session.user_id {
        return Err(ApiError::validation("author", "Cannot subscribe to yourself"));
    }
    let author = get_user_by_id(pool, author_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    log::debug!("> User {} subscribed to {author_id}", session.user_id);
    let recipes_count = count_author_recipes(author_id, pool).await?;
    subscription_view(author, recipes_count, recipes_limit, pool).await
}

pub async fn unsubscribe(
    author_id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Subscription"));
    }

    log::debug!("> User {} unsubscribed from {author_id}", session.user_id);
    Ok(())
}

/// Authors the session user follows, each with a preview of their newest recipes.
pub async fn fetch_subscriptions(
    page: PageRequest,
    page_size: i64,
    recipes_limit: Option<i64>,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Page<SubscriptionView>, ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let recipes_limit = check_recipes_limit(recipes_limit)?;
    let page_size = page.page_size(page_size);

    let rows: Vec<SubscriptionRow> = sqlx::query_as(
        "
        SELECT u.*,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(session.user_id)
    .bind(page_size)
    .bind(page.offset(page_size))
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(subscription_view(row.author, row.recipes_count, recipes_limit, pool).await?);
    }

    Ok(Page::from_rows(views, total_count, page_size, page.page))
}
