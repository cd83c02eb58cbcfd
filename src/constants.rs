pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 360;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32000;

pub const EMAIL_LENGTH: usize = 254;
pub const FIELD_LENGTH: usize = 150;
pub const TITLE_LENGTH: usize = 200;
pub const TAG_NAME_LENGTH: usize = 60;
pub const SHORT_FIELD_LENGTH: usize = 50;

pub const SESSION_LIFETIME_HOURS: i64 = 24;
pub const DATABASE_MAX_CONNECTIONS: u32 = 5;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const SESSION_SCHEMES: &[&str] = &["Bearer", "Token"];
