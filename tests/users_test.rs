mod common;

use common::{ingredient, staff, tag, user};
use foodgram_sdk::{
    create_tag,
    error::ApiError,
    fetch_users, find_tag_by_slug, get_ingredient, get_tag,
    jwt::{SessionData, SessionKey},
    login_user, migrate,
    pagination::PageRequest,
    set_password, subscribe,
};
use sqlx::PgPool;

fn key() -> SessionKey {
    SessionKey::new(
        b"test_secret_key_minimum_32_characters_long",
        chrono::Duration::hours(1),
    )
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_set_password(pool: PgPool) {
    let (anna, session) = user(&pool, "anna").await;

    let result = set_password("wrong password", "new secret", &session, &pool).await;
    assert!(matches!(
        result,
        Err(ApiError::Validation { field, .. }) if field == "current_password"
    ));

    let banned = SessionData {
        is_active: false,
        ..session.clone()
    };
    let result = set_password("correct horse", "new secret", &banned, &pool).await;
    assert!(matches!(result, Err(ApiError::PermissionDenied)));

    set_password("correct horse", "new secret", &session, &pool)
        .await
        .unwrap();
    assert!(login_user(&anna.email, "new secret", &key(), &pool).await.is_ok());
    assert!(login_user(&anna.email, "correct horse", &key(), &pool).await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_fetch_users(pool: PgPool) {
    let (_, reader) = user(&pool, "reader").await;
    let (bob, _) = user(&pool, "bob").await;
    user(&pool, "carol").await;
    subscribe(bob.id, None, &reader, &pool).await.unwrap();

    let page = fetch_users(PageRequest::new(1, Some(2)), 6, Some(&reader), &pool)
        .await
        .unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.next, Some(2));
    let names: Vec<(&str, bool)> = page
        .results
        .iter()
        .map(|user| (user.username.as_str(), user.is_subscribed))
        .collect();
    assert_eq!(names, vec![("bob", true), ("carol", false)]);

    let page = fetch_users(PageRequest::new(2, Some(2)), 6, None, &pool)
        .await
        .unwrap();
    assert_eq!(page.previous, Some(1));
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].username, "reader");
    assert!(!page.results[0].is_subscribed);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_catalog_lookups(pool: PgPool) {
    let admin = staff(&pool).await;
    let (_, cook) = user(&pool, "cook").await;
    let breakfast = tag(&pool, &admin, "breakfast").await;
    let milk = ingredient(&pool, &admin, "Milk", "ml").await;

    assert_eq!(get_tag(breakfast.id, &pool).await.unwrap(), Some(breakfast.clone()));
    assert_eq!(
        find_tag_by_slug("breakfast", &pool).await.unwrap(),
        Some(breakfast)
    );
    assert_eq!(find_tag_by_slug("supper", &pool).await.unwrap(), None);
    assert_eq!(get_ingredient(milk.id, &pool).await.unwrap(), Some(milk));

    let result = create_tag("Lunch", "#FF0000", "lunch", &cook, &pool).await;
    assert!(matches!(result, Err(ApiError::PermissionDenied)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires PostgreSQL via DATABASE_URL"]
async fn test_migrate_is_idempotent(pool: PgPool) {
    migrate(&pool).await.unwrap();

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}
