pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const SUBSCRIPTION_RECIPES_LIMIT: i64 = 3;

pub const MAX_LEN_EMAIL: usize = 256;
pub const MAX_LEN_USERNAME: usize = 32;
pub const MAX_LEN_USER_NAME_PART: usize = 32;

pub const MAX_LEN_RECIPE_NAME: usize = 64;
pub const MAX_LEN_RECIPE_TEXT: usize = 5000;
pub const MAX_LEN_INGREDIENT_NAME: usize = 64;
pub const MAX_LEN_MEASUREMENT_UNIT: usize = 24;
pub const MAX_LEN_TAG_NAME: usize = 64;
pub const MAX_LEN_TAG_SLUG: usize = 64;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 300;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32;

pub const MAX_SESSION_LIFETIME_HOURS: i64 = 24 * 365;
pub const SESSION_COOKIE: &str = "session";
pub const TOKEN_PREFIX: &str = "Token ";

pub const SHOPPING_LIST_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";
pub const SHOPPING_LIST_HEADER: &str = "Shopping list for:";
pub const SHOPPING_LIST_FOOTER: &str = "Calculated by Foodgram";
