use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    jwt::SessionData,
    schema::{Id, Tag},
    MAX_LEN_TAG_NAME, MAX_LEN_TAG_SLUG,
};

use sqlx::{Pool, Postgres};

pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub async fn create_tag(
    name: &str,
    color: &str,
    slug: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Tag, ApiError> {
    session.authenticate(ActionType::ManageTags)?;

    if name.is_empty() || name.chars().count() > MAX_LEN_TAG_NAME {
        return Err(ApiError::validation("name", "Invalid tag name"));
    }
    if !is_hex_color(color) {
        return Err(ApiError::validation("color", "Must be a HEX color code"));
    }
    if slug.is_empty()
        || slug.len() > MAX_LEN_TAG_SLUG
        || !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation("slug", "Invalid slug"));
    }

    let tag: Tag =
        sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING *")
            .bind(name)
            .bind(color)
            .bind(slug)
            .fetch_one(pool)
            .await?;

    Ok(tag)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn find_tag_by_slug(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn list_recipe_tags(recipe_id: Id, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(list)
}
