mod common;

use common::{ingredient, recipe_form, staff, tag, user};
use foodgram_sdk::{
    create_recipe, delete_recipe, error::ApiError, fetch_recipe_view, fetch_shopping_list,
    fetch_subscriptions, fetch_user_view, insert_member, is_favorite, is_in_shopping_cart,
    list_favorites, pagination::PageRequest, subscribe, toggle_favorite, toggle_shopping_cart,
    unsubscribe, RecipeList, SUBSCRIPTION_RECIPES_LIMIT,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_toggle_favorite_twice(pool: PgPool) {
    let admin = staff(&pool).await;
    let (_, cook) = user(&pool, "cook").await;
    let (fan, fan_session) = user(&pool, "fan").await;
    let dinner = tag(&pool, &admin, "dinner").await;
    let salt = ingredient(&pool, &admin, "Salt", "g").await;
    let recipe = create_recipe(recipe_form("Soup", &[dinner.id], &[(salt.id, 1)]), &cook, &pool)
        .await
        .unwrap();

    assert!(toggle_favorite(recipe.id, &fan_session, &pool).await.unwrap());
    assert!(is_favorite(recipe.id, fan.id, &pool).await.unwrap());
    assert_eq!(list_favorites(&fan_session, &pool).await.unwrap().len(), 1);

    let view = fetch_recipe_view(recipe.id, Some(&fan_session), &pool).await.unwrap();
    assert!(view.is_favorited);
    assert!(!view.is_in_shopping_cart);

    assert!(!toggle_favorite(recipe.id, &fan_session, &pool).await.unwrap());
    assert!(!is_favorite(recipe.id, fan.id, &pool).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_duplicate_membership_insert(pool: PgPool) {
    let admin = staff(&pool).await;
    let (_, cook) = user(&pool, "cook").await;
    let (fan, _) = user(&pool, "fan").await;
    let dinner = tag(&pool, &admin, "dinner").await;
    let salt = ingredient(&pool, &admin, "Salt", "g").await;
    let recipe = create_recipe(recipe_form("Soup", &[dinner.id], &[(salt.id, 1)]), &cook, &pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)")
        .bind(fan.id)
        .bind(recipe.id)
        .execute(&pool)
        .await
        .unwrap();

    let result = insert_member(RecipeList::Favorites, recipe.id, fan.id, &pool).await;
    assert!(matches!(result, Err(ApiError::AlreadyExists(_))));

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
        .bind(fan.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_delete_recipe_cascades_memberships(pool: PgPool) {
    let admin = staff(&pool).await;
    let (_, cook) = user(&pool, "cook").await;
    let (fan, fan_session) = user(&pool, "fan").await;
    let dinner = tag(&pool, &admin, "dinner").await;
    let salt = ingredient(&pool, &admin, "Salt", "g").await;
    let recipe = create_recipe(recipe_form("Soup", &[dinner.id], &[(salt.id, 1)]), &cook, &pool)
        .await
        .unwrap();

    toggle_favorite(recipe.id, &fan_session, &pool).await.unwrap();
    toggle_shopping_cart(recipe.id, &fan_session, &pool).await.unwrap();
    assert!(is_in_shopping_cart(recipe.id, fan.id, &pool).await.unwrap());

    delete_recipe(recipe.id, &cook, &pool).await.unwrap();

    for table in ["favorites", "shopping_carts", "recipe_tags", "recipe_ingredients"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0, "{table} kept rows of a deleted recipe");
    }
    assert!(list_favorites(&fan_session, &pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_toggle_missing_recipe(pool: PgPool) {
    let (_, cook) = user(&pool, "cook").await;

    let result = toggle_shopping_cart(777, &cook, &pool).await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_subscriptions(pool: PgPool) {
    let admin = staff(&pool).await;
    let (author, author_session) = user(&pool, "author").await;
    let (_, reader) = user(&pool, "reader").await;
    let dinner = tag(&pool, &admin, "dinner").await;
    let salt = ingredient(&pool, &admin, "Salt", "g").await;
    for name in ["Soup", "Stew", "Pie", "Roast"] {
        create_recipe(
            recipe_form(name, &[dinner.id], &[(salt.id, 1)]),
            &author_session,
            &pool,
        )
        .await
        .unwrap();
    }

    let result = subscribe(reader.user_id, None, &reader, &pool).await;
    assert!(matches!(result, Err(ApiError::Validation { .. })));

    let view = subscribe(author.id, Some(SUBSCRIPTION_RECIPES_LIMIT), &reader, &pool)
        .await
        .unwrap();
    assert_eq!(view.recipes_count, 4);
    assert_eq!(view.recipes.len(), 3);
    assert_eq!(view.recipes[0].name, "Roast");
    assert!(view.author.is_subscribed);

    let result = subscribe(author.id, None, &reader, &pool).await;
    assert!(matches!(result, Err(ApiError::AlreadyExists(_))));

    let author_view = fetch_user_view(author.id, Some(&reader), &pool).await.unwrap();
    assert!(author_view.is_subscribed);
    let anonymous_view = fetch_user_view(author.id, None, &pool).await.unwrap();
    assert!(!anonymous_view.is_subscribed);

    let page = fetch_subscriptions(PageRequest::new(1, None), 6, Some(1), &reader, &pool)
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].recipes.len(), 1);

    unsubscribe(author.id, &reader, &pool).await.unwrap();
    let result = unsubscribe(author.id, &reader, &pool).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_shopping_list_sums_cart(pool: PgPool) {
    let admin = staff(&pool).await;
    let (_, cook) = user(&pool, "cook").await;
    let dinner = tag(&pool, &admin, "dinner").await;
    let salt = ingredient(&pool, &admin, "Salt", "g").await;
    let milk = ingredient(&pool, &admin, "Milk", "ml").await;

    let result = fetch_shopping_list(&cook, &pool).await;
    assert!(matches!(result, Err(ApiError::EmptyResult(_))));

    let soup = create_recipe(recipe_form("Soup", &[dinner.id], &[(salt.id, 5)]), &cook, &pool)
        .await
        .unwrap();
    let stew = create_recipe(
        recipe_form("Stew", &[dinner.id], &[(salt.id, 3), (milk.id, 10)]),
        &cook,
        &pool,
    )
    .await
    .unwrap();
    toggle_shopping_cart(soup.id, &cook, &pool).await.unwrap();
    toggle_shopping_cart(stew.id, &cook, &pool).await.unwrap();

    let list = fetch_shopping_list(&cook, &pool).await.unwrap();
    let lines: Vec<String> = list.lines().collect();

    assert_eq!(lines, vec!["Milk: 10 ml", "Salt: 8 g"]);
}
