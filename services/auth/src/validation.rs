//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::models::Role;

/// Minimum password length accepted by the identity service
pub const MIN_PASSWORD_LEN: usize = 6;

/// Self-service account creation form
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub department_id: Option<Uuid>,
}

/// Account creation by an administrator
#[derive(Debug, Clone)]
pub struct NewUserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub role: Role,
    pub department_id: Uuid,
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

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    Ok(())
}

/// Validate the signup form, returning the chosen department
pub fn validate_signup(form: &SignupForm) -> Result<Uuid, String> {
    if form.password != form.confirm_password {
        return Err("Passwords do not match".to_string());
    }
    validate_password(&form.password)?;

    let department_id = form
        .department_id
        .ok_or_else(|| "Please select a department".to_string())?;

    validate_name(&form.name)?;
    validate_email(form.email.trim())?;
    Ok(department_id)
}

/// Validate an administrator's new-user form
pub fn validate_new_user(form: &NewUserForm) -> Result<(), String> {
    if form.password != form.password_confirm {
        return Err("Passwords don't match".to_string());
    }
    validate_password(&form.password)?;
    validate_name(&form.name)?;
    validate_email(form.email.trim())?;

    if !form.role.is_supported() {
        return Err("Role is required".to_string());
    }
    Ok(())
}
