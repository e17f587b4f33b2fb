use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    str::FromStr,
};

use serde_json::Value;

use super::{
    error::{ApiError, TypeError},
    schema::Id,
};
use crate::{
    MAX_AMOUNT, MAX_COOKING_TIME, MAX_LEN_RECIPE_NAME, MAX_LEN_RECIPE_TEXT, MIN_AMOUNT,
    MIN_COOKING_TIME,
};

pub type FormData = HashMap<String, Value>;

pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.trim().to_owned()),
                None => Err(TypeError::new(key, "Expected a string")),
            },
            None => Err(TypeError::new(key, "This field is required")),
        }
    }

    /// Accepts both JSON numbers and numeric strings.
    pub fn get_number<T>(&self, key: &str) -> Result<T, TypeError>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => parse_number(key, value),
            None => Err(TypeError::new(key, "This field is required")),
        }
    }

    /// Missing keys read as an empty list.
    pub fn get_list(&self, key: &str) -> Result<Vec<Value>, TypeError> {
        match self.inner.get(key) {
            Some(Value::Array(values)) => Ok(values.to_owned()),
            Some(Value::Null) | None => Ok(vec![]),
            Some(_) => Err(TypeError::new(key, "Expected a list")),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &Value) -> Result<T, TypeError> {
    let raw = match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        Value::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
            s.to_owned()
        }
        _ => return Err(TypeError::new(key, "Expected an integer")),
    };

    raw.parse()
        .map_err(|_e| TypeError::new(key, "Expected an integer"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Id,
    pub amount: i32,
}

impl TryFrom<&Value> for IngredientAmount {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let entry = value
            .as_object()
            .ok_or_else(|| TypeError::new("ingredients", "Expected {id, amount} objects"))?;

        let id = entry
            .get("id")
            .ok_or_else(|| TypeError::new("ingredients", "Ingredient id is required"))
            .and_then(|id| parse_number::<Id>("ingredients", id))?;

        let amount = entry
            .get("amount")
            .ok_or_else(|| TypeError::new("amount", "Amount is required"))
            .and_then(|amount| {
                parse_number::<i64>("amount", amount)
                    .map_err(|_e| TypeError::new("amount", "Amount must be a positive integer"))
            })?;

        if amount < MIN_AMOUNT as i64 {
            return Err(TypeError::new("amount", "Amount must be a positive integer"));
        }

        Ok(Self {
            id,
            amount: amount.min(i32::MAX as i64) as i32,
        })
    }
}

/// Raw recipe write, as received from the client
#[derive(Debug, Clone)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmount>,
}

impl TryFrom<FormData> for RecipeForm {
    type Error = TypeError;

    fn try_from(data: FormData) -> Result<Self, Self::Error> {
        let form = Form::from_data(data);

        let tags = form
            .get_list("tags")?
            .iter()
            .map(|tag| parse_number::<Id>("tags", tag))
            .collect::<Result<Vec<Id>, TypeError>>()?;

        let ingredients = form
            .get_list("ingredients")?
            .iter()
            .map(IngredientAmount::try_from)
            .collect::<Result<Vec<IngredientAmount>, TypeError>>()?;

        Ok(Self {
            name: form.get_str("name")?,
            text: form.get_str("text")?,
            image: form.get_str("image")?,
            cooking_time: form.get_number("cooking_time")?,
            tags,
            ingredients,
        })
    }
}

/// Recipe write that passed every check that doesn't need the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecipe {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    /// Deduplicated, ascending
    pub tags: Vec<Id>,
    /// One entry per ingredient id, ascending, duplicate amounts summed
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeForm {
    pub fn validate(self) -> Result<ValidatedRecipe, ApiError> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_LEN_RECIPE_NAME {
            return Err(ApiError::validation(
                "name",
                &format!("Name must be 1..={MAX_LEN_RECIPE_NAME} characters"),
            ));
        }
        if self.text.chars().count() > MAX_LEN_RECIPE_TEXT {
            return Err(ApiError::validation(
                "text",
                &format!("Text can't exceed {MAX_LEN_RECIPE_TEXT} characters"),
            ));
        }
        if self.image.is_empty() {
            return Err(ApiError::validation("image", "Image is required"));
        }
        if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&self.cooking_time) {
            return Err(ApiError::validation(
                "cooking_time",
                &format!("Cooking time must be {MIN_COOKING_TIME}..={MAX_COOKING_TIME} minutes"),
            ));
        }
        if self.tags.is_empty() {
            return Err(ApiError::validation("tags", "At least one tag is required"));
        }
        if self.ingredients.is_empty() {
            return Err(ApiError::validation(
                "ingredients",
                "At least one ingredient is required",
            ));
        }

        let tags = self
            .tags
            .into_iter()
            .collect::<BTreeSet<Id>>()
            .into_iter()
            .collect();
        let ingredients = merge_ingredient_amounts(&self.ingredients)?;

        Ok(ValidatedRecipe {
            name: self.name,
            text: self.text,
            image: self.image,
            cooking_time: self.cooking_time,
            tags,
            ingredients,
        })
    }
}

/// Sums the amounts of repeated ingredient ids. The summed amount is what
/// gets stored, so that is what has to fit the amount bounds.
pub fn merge_ingredient_amounts(
    parts: &[IngredientAmount],
) -> Result<Vec<IngredientAmount>, ApiError> {
    let mut merged: BTreeMap<Id, i64> = BTreeMap::new();
    for part in parts {
        *merged.entry(part.id).or_insert(0) += part.amount as i64;
    }

    merged
        .into_iter()
        .map(|(id, amount)| {
            if amount < MIN_AMOUNT as i64 || amount > MAX_AMOUNT as i64 {
                return Err(ApiError::validation(
                    "amount",
                    &format!("Amount of ingredient {id} must be {MIN_AMOUNT}..={MAX_AMOUNT}"),
                ));
            }
            Ok(IngredientAmount {
                id,
                amount: amount as i32,
            })
        })
        .collect()
}
