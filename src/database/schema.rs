use serde::{Deserialize, Serialize};

pub type Uuid = i32;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// A user as seen by the caller.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// A followed author together with a preview of their recipes.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AuthorView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

/// Row of the ingredient fixture used by the bulk import.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
}

/// Ingredient line of a recipe, as stored in `recipe_ingredients` joined
/// with `ingredients`.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipePart {
    #[serde(skip)]
    pub recipe_id: Uuid,
    #[serde(rename = "id")]
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkedRecipeTag {
    pub recipe_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<LinkedRecipeTag> for Tag {
    fn from(value: LinkedRecipeTag) -> Self {
        Self {
            id: value.id,
            name: value.name,
            color: value.color,
            slug: value.slug,
        }
    }
}

/// Flat row used to assemble a [`RecipeDetail`]. Carries the author and the
/// caller specific flags.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,

    pub author_id: Uuid,
    pub author_email: String,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_is_subscribed: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub author: UserView,
    pub name: String,
    pub image: String,
    pub text: String,
    pub ingredients: Vec<RecipePart>,
    pub tags: Vec<Tag>,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeDetail {
    pub fn from_row(row: RecipeRow, ingredients: Vec<RecipePart>, tags: Vec<Tag>) -> Self {
        Self {
            id: row.id,
            author: UserView {
                id: row.author_id,
                email: row.author_email,
                username: row.author_username,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
                is_subscribed: row.author_is_subscribed,
            },
            name: row.name,
            image: row.image,
            text: row.text,
            ingredients,
            tags,
            cooking_time: row.cooking_time,
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
        }
    }
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeShort {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeShort {
    fn from(value: Recipe) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image: value.image,
            cooking_time: value.cooking_time,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

/// Body of a recipe create or update.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Uuid>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RecipeFilter {
    #[serde(default)]
    pub author: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorited: bool,
    #[serde(default)]
    pub is_in_shopping_cart: bool,
}

/// One aggregated line of the shopping list.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// A [`RecipeShort`] together with its author, used to group previews by
/// followed author.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkedRecipeShort {
    pub author_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<LinkedRecipeShort> for RecipeShort {
    fn from(value: LinkedRecipeShort) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image: value.image,
            cooking_time: value.cooking_time,
        }
    }
}
