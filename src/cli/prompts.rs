//! Interactive prompts used by the menu mode.

use crate::db::PropertyFilter;
use crate::error::{AppError, Result};
use crate::models::{NewProperty, NewUser};
use dialoguer::{theme::ColorfulTheme, Input, Password};
use std::str::FromStr;

/// Parses an optional answer: blank input is `None`.
pub fn parse_optional<T: FromStr>(raw: &str) -> std::result::Result<Option<T>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| format!("{raw:?} is not a valid value"))
}

fn prompt_text(prompt: &str) -> Result<String> {
    Ok(Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()?)
}

fn prompt_number<T>(prompt: &str) -> Result<T>
where
    T: FromStr + Clone + ToString,
    <T as FromStr>::Err: ToString,
{
    Ok(Input::<T>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()?)
}

/// Asks for a value that may be left blank.
fn prompt_optional<T: FromStr>(prompt: &str) -> Result<Option<T>> {
    let raw = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{prompt} (leave blank to skip)"))
        .allow_empty(true)
        .validate_with(|input: &String| parse_optional::<T>(input).map(|_| ()))
        .interact_text()?;
    parse_optional::<T>(&raw).map_err(AppError::Cli)
}

pub fn prompt_email() -> Result<String> {
    prompt_text("Email")
}

pub fn prompt_user_id() -> Result<i32> {
    prompt_number("User id")
}

pub fn prompt_limit(default: i64) -> Result<i64> {
    Ok(Input::<i64>::with_theme(&ColorfulTheme::default())
        .with_prompt("Maximum rows")
        .default(default)
        .interact_text()?)
}

pub fn prompt_new_user() -> Result<NewUser> {
    let name = prompt_text("Name")?;
    let email = prompt_text("Email")?;
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    Ok(NewUser {
        name,
        email,
        password,
    })
}

pub fn prompt_filter() -> Result<PropertyFilter> {
    Ok(PropertyFilter {
        city: prompt_optional("City")?,
        owner_id: prompt_optional("Owner id")?,
        minimum_price_per_night: prompt_optional("Minimum price per night")?,
        maximum_price_per_night: prompt_optional("Maximum price per night")?,
        minimum_rating: prompt_optional("Minimum rating")?,
    })
}

pub fn prompt_new_property() -> Result<NewProperty> {
    Ok(NewProperty {
        title: prompt_text("Title")?,
        description: prompt_optional("Description")?,
        number_of_bedrooms: prompt_number("Bedrooms")?,
        number_of_bathrooms: prompt_number("Bathrooms")?,
        parking_spaces: prompt_number("Parking spaces")?,
        cost_per_night: prompt_number("Cost per night (cents)")?,
        thumbnail_photo_url: prompt_text("Thumbnail photo URL")?,
        cover_photo_url: prompt_text("Cover photo URL")?,
        street: prompt_text("Street")?,
        country: prompt_text("Country")?,
        city: prompt_text("City")?,
        province: prompt_text("Province")?,
        post_code: prompt_text("Post code")?,
        owner_id: prompt_number("Owner id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_blank_is_none() {
        assert_eq!(parse_optional::<i64>(""), Ok(None));
        assert_eq!(parse_optional::<i64>("   "), Ok(None));
    }

    #[test]
    fn test_parse_optional_values() {
        assert_eq!(parse_optional::<i64>(" 150 "), Ok(Some(150)));
        assert_eq!(parse_optional::<f64>("4.5"), Ok(Some(4.5)));
        assert_eq!(
            parse_optional::<String>("Vancouver"),
            Ok(Some("Vancouver".to_string()))
        );
    }

    #[test]
    fn test_parse_optional_rejects_garbage() {
        let err = parse_optional::<i32>("twelve").unwrap_err();
        assert!(err.contains("twelve"));
    }
}
