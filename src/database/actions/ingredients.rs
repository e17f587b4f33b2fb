use std::{cmp::Ordering, collections::HashSet};

use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    jwt::SessionData,
    schema::{Id, Ingredient},
    MAX_LEN_INGREDIENT_NAME, MAX_LEN_MEASUREMENT_UNIT,
};

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ApiError> {
    session.authenticate(ActionType::ManageIngredients)?;

    let name = name.trim();
    let measurement_unit = measurement_unit.trim();
    if name.is_empty() || name.chars().count() > MAX_LEN_INGREDIENT_NAME {
        return Err(ApiError::validation("name", "Invalid ingredient name"));
    }
    if measurement_unit.is_empty() || measurement_unit.chars().count() > MAX_LEN_MEASUREMENT_UNIT {
        return Err(ApiError::validation(
            "measurement_unit",
            "Invalid measurement unit",
        ));
    }

    let row: Ingredient = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Escapes LIKE wildcards so the query matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive, ties broken by the exact bytes
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Names starting with the query come first, then names that only contain it.
/// Each tier is ordered by name and an ingredient appears at most once.
pub fn rank_by_name_match(query: &str, candidates: Vec<Ingredient>) -> Vec<Ingredient> {
    let query = query.to_lowercase();
    let mut seen: HashSet<Id> = HashSet::new();

    let (mut prefixed, mut contained): (Vec<Ingredient>, Vec<Ingredient>) = candidates
        .into_iter()
        .filter(|ingredient| seen.insert(ingredient.id))
        .filter(|ingredient| ingredient.name.to_lowercase().contains(&query))
        .partition(|ingredient| ingredient.name.to_lowercase().starts_with(&query));

    let by_name = |a: &Ingredient, b: &Ingredient| {
        compare_names(&a.name, &b.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
    };
    prefixed.sort_by(by_name);
    contained.sort_by(by_name);

    prefixed.extend(contained);
    prefixed
}

pub async fn search_ingredients(
    query: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return list_ingredients(pool).await;
    }

    let rows: Vec<Ingredient> = sqlx::query_as(
        "SELECT * FROM ingredients WHERE name ILIKE '%' || $1 || '%' ESCAPE '\\' ORDER BY name",
    )
    .bind(escape_like(query))
    .fetch_all(pool)
    .await?;

    log::trace!("> Ingredient search {query:?} matched {} rows", rows.len());
    Ok(rank_by_name_match(query, rows))
}
