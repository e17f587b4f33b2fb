use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    jwt::SessionData,
    schema::{Id, RecipeShort},
};

use super::get_recipe_short;

/// Per-user recipe membership lists that share the toggle semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_carts",
        }
    }

    fn action(self) -> ActionType {
        match self {
            RecipeList::Favorites => ActionType::ManageOwnFavorites,
            RecipeList::ShoppingCart => ActionType::ManageOwnShoppingCart,
        }
    }
}

async fn is_member(
    list: RecipeList,
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: (bool,) = sqlx::query_as(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND recipe_id = $2)",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Flips membership of the recipe in the session user's list.
/// Returns true if the recipe is now in the list.
async fn toggle_member(
    list: RecipeList,
    recipe_id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    session.authenticate(list.action())?;
    get_recipe_short(recipe_id, pool).await?;

    let removed = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        list.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if removed.rows_affected() > 0 {
        log::trace!("> Removed recipe {recipe_id} from {:?} of user {}", list, session.user_id);
        return Ok(false);
    }

    insert_member(list, recipe_id, session.user_id, pool).await?;
    Ok(true)
}

/// A pair that is already present (e.g. inserted by a concurrent toggle)
/// surfaces as `AlreadyExists`, never as a second row.
pub async fn insert_member(
    list: RecipeList,
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2)",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    log::trace!("> Added recipe {recipe_id} to {:?} of user {user_id}", list);
    Ok(())
}

pub async fn is_favorite(recipe_id: Id, user_id: Id, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    is_member(RecipeList::Favorites, recipe_id, user_id, pool).await
}

pub async fn is_in_shopping_cart(
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    is_member(RecipeList::ShoppingCart, recipe_id, user_id, pool).await
}

pub async fn toggle_favorite(
    recipe_id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    toggle_member(RecipeList::Favorites, recipe_id, session, pool).await
}

pub async fn toggle_shopping_cart(
    recipe_id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    toggle_member(RecipeList::ShoppingCart, recipe_id, session, pool).await
}

/// Recipes in the list, most recently added first
pub async fn list_members(
    list: RecipeList,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeShort>, ApiError> {
    session.authenticate(list.action())?;

    let rows: Vec<RecipeShort> = sqlx::query_as(&format!(
        "
        SELECT r.id, r.name, r.image, r.cooking_time
        FROM {} m
        INNER JOIN recipes r ON r.id = m.recipe_id
        WHERE m.user_id = $1
        ORDER BY m.date_added DESC, r.id DESC
    ",
        list.table()
    ))
    .bind(session.user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_favorites(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeShort>, ApiError> {
    list_members(RecipeList::Favorites, session, pool).await
}
