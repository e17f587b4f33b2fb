use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, TimeZone};
use sqlx::{Pool, Postgres};
use warp::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    Reply,
};

use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    jwt::SessionData,
    schema::{ShoppingListItem, ShoppingListPart, User},
    SHOPPING_LIST_DATE_FORMAT, SHOPPING_LIST_FOOTER, SHOPPING_LIST_HEADER,
};

use super::compare_names;

/// Summed ingredient amounts over every recipe in a cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingList {
    items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn from_parts(parts: Vec<ShoppingListPart>) -> Self {
        Self {
            items: aggregate_shopping_list(parts),
        }
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `{name}: {amount} {unit}` per item
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.items
            .iter()
            .map(|item| format!("{}: {} {}", item.name, item.amount, item.measurement_unit))
    }

    pub fn render<Tz>(&self, display_name: &str, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut text = format!(
            "{SHOPPING_LIST_HEADER} {display_name}\n\n{}\n",
            now.format(SHOPPING_LIST_DATE_FORMAT)
        );
        for line in self.lines() {
            text.push_str(&line);
            text.push('\n');
        }
        text.push('\n');
        text.push_str(SHOPPING_LIST_FOOTER);
        text
    }

    pub fn filename(username: &str) -> String {
        format!("{username}_shopping_list.txt")
    }
}

/// Groups by (name, unit) and sums amounts; sorted by name, then unit,
/// in the same order the ingredient search uses.
pub fn aggregate_shopping_list(parts: Vec<ShoppingListPart>) -> Vec<ShoppingListItem> {
    let mut items: Vec<ShoppingListItem> = parts
        .into_iter()
        .fold(
            BTreeMap::<(String, String), i64>::new(),
            |mut acc, part| {
                *acc.entry((part.name, part.measurement_unit)).or_insert(0) += part.amount as i64;
                acc
            },
        )
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListItem {
            name,
            measurement_unit,
            amount,
        })
        .collect();

    items.sort_by(|a, b| {
        compare_names(&a.name, &b.name).then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
    });
    items
}

pub async fn fetch_shopping_list(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<ShoppingList, ApiError> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;

    let parts: Vec<ShoppingListPart> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_carts c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(session.user_id)
    .fetch_all(pool)
    .await?;

    if parts.is_empty() {
        return Err(ApiError::EmptyResult("Shopping cart".to_owned()));
    }

    log::trace!(
        "> Aggregating {} shopping list parts for user {}",
        parts.len(),
        session.user_id
    );
    Ok(ShoppingList::from_parts(parts))
}

/// The rendered list as a plain text attachment
pub fn shopping_list_reply<Tz>(list: &ShoppingList, user: &User, now: &DateTime<Tz>) -> impl Reply
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let display_name = if user.first_name.is_empty() {
        &user.username
    } else {
        &user.first_name
    };

    let reply = warp::reply::with_header(
        list.render(display_name, now),
        CONTENT_TYPE,
        "text/plain; charset=utf-8",
    );
    warp::reply::with_header(
        reply,
        CONTENT_DISPOSITION,
        format!(
            "attachment; filename={}",
            ShoppingList::filename(&user.username)
        ),
    )
}
