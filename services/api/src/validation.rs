//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use common::{NewUser, UpdateUser};

/// Validate a user id relayed from the identity provider
pub fn validate_user_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("User id is required".to_string());
    }

    if id.len() > 128 {
        return Err("User id must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<(), String> {
    validate_user_id(&user.id)?;
    validate_email(&user.email)
}

pub fn validate_update_user(changes: &UpdateUser) -> Result<(), String> {
    match changes.email.as_deref() {
        Some(email) => validate_email(email),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert_eq!(validate_email(""), Err("Email is required".to_string()));
        assert_eq!(
            validate_email("not-an-email"),
            Err("Invalid email format".to_string())
        );
        assert!(validate_email(&format!("{}@example.com", "a".repeat(250))).is_err());
    }

    #[test]
    fn test_validate_new_user() {
        let user = NewUser {
            id: " ".to_string(),
            email: "ada@example.com".to_string(),
            full_name: None,
            avatar_url: None,
        };
        assert_eq!(
            validate_new_user(&user),
            Err("User id is required".to_string())
        );
    }

    #[test]
    fn test_validate_update_user_only_checks_present_email() {
        assert!(validate_update_user(&UpdateUser::default()).is_ok());
        assert!(
            validate_update_user(&UpdateUser {
                email: Some("nope".to_string()),
                ..Default::default()
            })
            .is_err()
        );
    }
}
