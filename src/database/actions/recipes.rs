use std::collections::BTreeSet;

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    form::{RecipeForm, ValidatedRecipe},
    jwt::SessionData,
    pagination::{Page, PageRequest},
    schema::{Id, Recipe, RecipeFilter, RecipeIngredient, RecipeRow, RecipeShort, RecipeView},
};

use super::{fetch_user_view, is_favorite, is_in_shopping_cart, list_recipe_tags};

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_recipe_short(id: Id, pool: &Pool<Postgres>) -> Result<RecipeShort, ApiError> {
    let row: Option<RecipeShort> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    row.ok_or_else(|| ApiError::not_found("Recipe"))
}

/// Loads a recipe the session is allowed to modify: its author, or staff.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;
    let recipe = get_recipe(id, pool).await?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != Some(session.user_id) {
                    Err(ApiError::PermissionDenied)
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::not_found("Recipe")),
    }
}

pub async fn list_recipe_ingredients(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, ApiError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Requested ids that weren't found, ascending
pub fn missing_ids(requested: &[Id], found: &[Id]) -> Vec<Id> {
    let found: BTreeSet<&Id> = found.iter().collect();
    requested
        .iter()
        .filter(|id| !found.contains(id))
        .copied()
        .collect::<BTreeSet<Id>>()
        .into_iter()
        .collect()
}

fn format_ids(ids: &[Id]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Every tag and ingredient of the write must exist; reported as a
/// validation error rather than a foreign key failure.
async fn check_references(
    recipe: &ValidatedRecipe,
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    let tags: Vec<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(recipe.tags.as_slice())
        .fetch_all(&mut *conn)
        .await?;
    let tags: Vec<Id> = tags.into_iter().map(|tag| tag.0).collect();

    let missing = missing_ids(&recipe.tags, &tags);
    if !missing.is_empty() {
        return Err(ApiError::validation(
            "tags",
            &format!("Unknown tag ids: {}", format_ids(&missing)),
        ));
    }

    let requested: Vec<Id> = recipe.ingredients.iter().map(|part| part.id).collect();
    let ingredients: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(requested.as_slice())
        .fetch_all(&mut *conn)
        .await?;
    let ingredients: Vec<Id> = ingredients.into_iter().map(|ingredient| ingredient.0).collect();

    let missing = missing_ids(&requested, &ingredients);
    if !missing.is_empty() {
        return Err(ApiError::validation(
            "ingredients",
            &format!("Unknown ingredient ids: {}", format_ids(&missing)),
        ));
    }

    Ok(())
}

/// Clear-then-insert of the tag links and amount rows
async fn replace_recipe_links(
    recipe_id: Id,
    recipe: &ValidatedRecipe,
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query_builder.push_values(recipe.tags.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });
    query_builder.build().execute(&mut *conn).await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(recipe.ingredients.iter(), |mut b, part| {
        b.push_bind(recipe_id)
            .push_bind(part.id)
            .push_bind(part.amount);
    });
    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

pub async fn create_recipe(
    form: RecipeForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    session.authenticate(ActionType::CreateRecipes)?;
    let recipe = form.validate()?;

    let mut tr = pool.begin().await?;
    check_references(&recipe, &mut tr).await?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&recipe.name)
    .bind(&recipe.text)
    .bind(&recipe.image)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tr)
    .await?;

    replace_recipe_links(id.0, &recipe, &mut tr).await?;
    tr.commit().await?;

    log::debug!("> Created recipe {} by user {}", id.0, session.user_id);
    fetch_recipe_view(id.0, Some(session), pool).await
}

/// Replaces every field, the tag set and the ingredient set of a recipe.
/// On any failure the previous state is left untouched.
pub async fn update_recipe(
    id: Id,
    form: RecipeForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    get_recipe_mut(id, session, pool).await?;
    let recipe = form.validate()?;

    let mut tr = pool.begin().await?;
    check_references(&recipe, &mut tr).await?;

    let result = sqlx::query(
        "UPDATE recipes SET name = $1, text = $2, image = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&recipe.name)
    .bind(&recipe.text)
    .bind(&recipe.image)
    .bind(recipe.cooking_time)
    .bind(id)
    .execute(&mut *tr)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Recipe"));
    }

    replace_recipe_links(id, &recipe, &mut tr).await?;
    tr.commit().await?;

    log::debug!("> Updated recipe {id} by user {}", session.user_id);
    fetch_recipe_view(id, Some(session), pool).await
}

/// Tag links, amount rows and favorite/cart memberships cascade.
pub async fn delete_recipe(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    get_recipe_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    log::debug!("> Deleted recipe {id} by user {}", session.user_id);
    Ok(())
}

async fn build_recipe_view(
    recipe: Recipe,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let author = match recipe.author_id {
        Some(author_id) => Some(fetch_user_view(author_id, viewer, pool).await?),
        None => None,
    };

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            is_favorite(recipe.id, viewer.user_id, pool).await?,
            is_in_shopping_cart(recipe.id, viewer.user_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        tags: list_recipe_tags(recipe.id, pool).await?,
        author,
        ingredients: list_recipe_ingredients(recipe.id, pool).await?,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

pub async fn fetch_recipe_view(
    id: Id,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe"))?;

    build_recipe_view(recipe, viewer, pool).await
}

/// Membership filters only apply when there is a viewer to be relative to.
fn push_membership_filter(
    query_builder: &mut QueryBuilder<'_, Postgres>,
    table: &str,
    wanted: Option<bool>,
    viewer: Option<&SessionData>,
) {
    if let (Some(wanted), Some(viewer)) = (wanted, viewer) {
        let exists = if wanted { "EXISTS" } else { "NOT EXISTS" };
        query_builder
            .push(format!(
                " AND {exists} (SELECT 1 FROM {table} m WHERE m.recipe_id = r.id AND m.user_id = "
            ))
            .push_bind(viewer.user_id)
            .push(")");
    }
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    page: PageRequest,
    page_size: i64,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Page<RecipeView>, ApiError> {
    let page_size = page.page_size(page_size);
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if !filter.tags.is_empty() {
        query_builder
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    push_membership_filter(&mut query_builder, "favorites", filter.is_favorited, viewer);
    push_membership_filter(
        &mut query_builder,
        "shopping_carts",
        filter.is_in_shopping_cart,
        viewer,
    );

    query_builder
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind(page.offset(page_size));

    let rows: Vec<RecipeRow> = query_builder.build_query_as().fetch_all(pool).await?;
    let total_count = rows.first().map(|row| row.count).unwrap_or(0);

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(build_recipe_view(row.recipe, viewer, pool).await?);
    }

    Ok(Page::from_rows(views, total_count, page_size, page.page))
}
