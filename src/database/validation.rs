//! Field and cross-entity checks run before any mutation touches the store.

use std::collections::HashSet;

use crate::{
    config::Bounds,
    constants::{EMAIL_LENGTH, FIELD_LENGTH, SHORT_FIELD_LENGTH, TAG_NAME_LENGTH, TITLE_LENGTH},
    error::ValidationError,
    schema::{IngredientRecord, NewTag, NewUser, RecipeForm, Uuid},
};

pub fn validate_recipe_form(form: &RecipeForm, bounds: &Bounds) -> Result<(), ValidationError> {
    validate_recipe_name(&form.name)?;

    if form.text.trim().is_empty() {
        return Err(ValidationError::field("text", "Description can't be empty"));
    }

    validate_cooking_time(form.cooking_time, bounds)?;
    validate_ingredients(form, bounds)?;
    validate_tags(&form.tags)?;

    Ok(())
}

pub fn validate_recipe_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::field("name", "Name can't be empty"));
    }
    if name.chars().count() > TITLE_LENGTH {
        return Err(ValidationError::field("name", "Name is too long"));
    }
    if !name.chars().any(char::is_alphabetic) {
        return Err(ValidationError::field("name", "There are no letters in the name"));
    }

    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32, bounds: &Bounds) -> Result<(), ValidationError> {
    if !(bounds.min_cooking_time..=bounds.max_cooking_time).contains(&cooking_time) {
        return Err(ValidationError::field(
            "cooking_time",
            &format!(
                "Cooking time must be between {} and {}",
                bounds.min_cooking_time, bounds.max_cooking_time
            ),
        ));
    }

    Ok(())
}

fn validate_ingredients(form: &RecipeForm, bounds: &Bounds) -> Result<(), ValidationError> {
    if form.ingredients.is_empty() {
        return Err(ValidationError::field("ingredients", "No ingredients"));
    }

    let mut seen = HashSet::new();
    for ingredient in form.ingredients.iter() {
        if !seen.insert(ingredient.id) {
            return Err(ValidationError::field(
                "ingredients",
                &format!("Ingredient {} is already used", ingredient.id),
            ));
        }
        if ingredient.amount <= 0 || ingredient.amount < bounds.min_amount {
            return Err(ValidationError::field(
                "ingredients",
                &format!("Amount should be at least {}", bounds.min_amount.max(1)),
            ));
        }
        if ingredient.amount > bounds.max_amount {
            return Err(ValidationError::field(
                "ingredients",
                &format!("Amount should be at most {}", bounds.max_amount),
            ));
        }
    }

    Ok(())
}

fn validate_tags(tags: &[Uuid]) -> Result<(), ValidationError> {
    if tags.is_empty() {
        return Err(ValidationError::field("tags", "No tags"));
    }

    let mut seen = HashSet::new();
    if let Some(tag) = tags.iter().find(|tag| !seen.insert(**tag)) {
        return Err(ValidationError::field(
            "tags",
            &format!("Tag {tag} is already used"),
        ));
    }

    Ok(())
}

pub fn validate_follow(follower_id: Uuid, author_id: Uuid) -> Result<(), ValidationError> {
    if follower_id == author_id {
        return Err(ValidationError::new(
            "It is impossible to subscribe to yourself",
        ));
    }

    Ok(())
}

/// Usernames are restricted to word characters and `.@+-`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() || username.chars().count() > FIELD_LENGTH {
        return Err(ValidationError::field(
            "username",
            &format!("Username must be 1 to {FIELD_LENGTH} characters"),
        ));
    }

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if !username.chars().all(allowed) {
        return Err(ValidationError::field(
            "username",
            "Username may only contain letters, digits and @/./+/-/_",
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.chars().count() > EMAIL_LENGTH {
        return Err(ValidationError::field("email", "Email is too long"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::field("email", "Enter a valid email address"));
    }

    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationError> {
    validate_email(&user.email)?;
    validate_username(&user.username)?;

    for (field, value) in [("first_name", &user.first_name), ("last_name", &user.last_name)] {
        if value.trim().is_empty() {
            return Err(ValidationError::field(field, "This field may not be blank"));
        }
        if value.chars().count() > FIELD_LENGTH {
            return Err(ValidationError::field(field, "This field is too long"));
        }
    }

    validate_password(&user.password)
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::field("password", "This field may not be blank"));
    }

    Ok(())
}

pub fn validate_ingredient(record: &IngredientRecord) -> Result<(), ValidationError> {
    let name = record.name.trim();
    if name.is_empty() || name.chars().count() > TITLE_LENGTH {
        return Err(ValidationError::field(
            "name",
            &format!("Ingredient name must be 1 to {TITLE_LENGTH} characters"),
        ));
    }

    let unit = record.measurement_unit.trim();
    if unit.is_empty() || unit.chars().count() > SHORT_FIELD_LENGTH {
        return Err(ValidationError::field(
            "measurement_unit",
            &format!("Measurement unit must be 1 to {SHORT_FIELD_LENGTH} characters"),
        ));
    }

    Ok(())
}

/// Tags carry a `#RRGGBB` color and a url-safe slug.
pub fn validate_new_tag(tag: &NewTag) -> Result<(), ValidationError> {
    if tag.name.trim().is_empty() || tag.name.chars().count() > TAG_NAME_LENGTH {
        return Err(ValidationError::field(
            "name",
            &format!("Tag name must be 1 to {TAG_NAME_LENGTH} characters"),
        ));
    }

    let color = tag.color.strip_prefix('#').unwrap_or("");
    if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::field("color", "Color must be a hex value like #E26C2D"));
    }

    if tag.slug.is_empty()
        || tag.slug.len() > SHORT_FIELD_LENGTH
        || !tag
            .slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::field(
            "slug",
            "Slug may only contain letters, digits, hyphens and underscores",
        ));
    }

    Ok(())
}
