#![allow(dead_code)]

use foodgram_sdk::{
    create_ingredient, create_tag,
    form::{IngredientAmount, RecipeForm},
    jwt::SessionData,
    register_user,
    schema::{Id, Ingredient, NewUser, Tag, User, UserRole},
};
use sqlx::PgPool;

pub async fn user(pool: &PgPool, username: &str) -> (User, SessionData) {
    let user = register_user(
        NewUser {
            email: format!("{username}@example.com"),
            username: username.to_owned(),
            first_name: username.to_owned(),
            last_name: "Cook".to_owned(),
            password: "correct horse".to_owned(),
        },
        pool,
    )
    .await
    .unwrap();
    let session = SessionData::from(&user);
    (user, session)
}

pub async fn staff(pool: &PgPool) -> SessionData {
    let (_, session) = user(pool, "admin").await;
    SessionData {
        role: UserRole::Staff,
        ..session
    }
}

/// Colors are unique per tag, so derive one from the slug
pub async fn tag(pool: &PgPool, staff: &SessionData, slug: &str) -> Tag {
    let seed = slug
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    let color = format!("#{:06X}", seed & 0xFF_FFFF);
    create_tag(slug, &color, slug, staff, pool).await.unwrap()
}

pub async fn ingredient(pool: &PgPool, staff: &SessionData, name: &str, unit: &str) -> Ingredient {
    create_ingredient(name, unit, staff, pool).await.unwrap()
}

pub fn recipe_form(name: &str, tags: &[Id], ingredients: &[(Id, i32)]) -> RecipeForm {
    RecipeForm {
        name: name.to_owned(),
        text: "Mix everything.".to_owned(),
        image: "recipes/images/dish.png".to_owned(),
        cooking_time: 15,
        tags: tags.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|(id, amount)| IngredientAmount {
                id: *id,
                amount: *amount,
            })
            .collect(),
    }
}
