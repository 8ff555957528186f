use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::domain::{Gender, ProfileChanges, User, UserProfile};

/// Field name -> messages, cross-field messages under `__all__`
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Profile edit form as submitted; every input arrives as text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub age: String,
    pub location: String,
    pub gender: String,
    pub gender_pref: String,
    pub from_age: String,
    pub to_age: String,
    pub about_me: String,
    pub avatar: Option<String>,
}

/// Profile inputs once every field has parsed
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_age_range"))]
struct ProfileFields {
    #[validate(range(min = 18, max = 120))]
    age: i64,
    #[validate(length(max = 100))]
    location: String,
    gender: Gender,
    gender_pref: Gender,
    #[validate(range(min = 18, max = 120))]
    from_age: i64,
    #[validate(range(min = 18, max = 120))]
    to_age: i64,
    #[validate(length(max = 1000))]
    about_me: String,
    #[validate(length(max = 255))]
    avatar: Option<String>,
}

fn validate_age_range(fields: &ProfileFields) -> Result<(), ValidationError> {
    if fields.from_age > fields.to_age {
        let mut err = ValidationError::new("age_range");
        err.message = Some("Preferred age range is inverted: from_age is above to_age".into());
        return Err(err);
    }
    Ok(())
}

impl ProfileFields {
    // ages are range-checked by `validate` before this runs
    fn into_changes(self) -> ProfileChanges {
        ProfileChanges {
            age: self.age as u8,
            location: self.location.trim().to_string(),
            gender: self.gender,
            gender_pref: self.gender_pref,
            from_age: self.from_age as u8,
            to_age: self.to_age as u8,
            about_me: self.about_me,
            // an empty file input means "no avatar"
            avatar: self.avatar.filter(|a| !a.trim().is_empty()),
        }
    }
}

const REQUIRED: &str = "This field is required.";

fn parse_whole_number(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let message = if raw.is_empty() {
        REQUIRED.to_string()
    } else {
        match raw.parse() {
            Ok(n) => return Some(n),
            Err(_) => "Enter a whole number.".to_string(),
        }
    };
    errors.entry(field.to_string()).or_default().push(message);
    None
}

fn parse_gender(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<Gender> {
    let raw = raw.trim();
    let message = if raw.is_empty() {
        REQUIRED.to_string()
    } else {
        match raw.parse() {
            Ok(gender) => return Some(gender),
            Err(_) => format!("Select a valid choice. {} is not one of the available choices.", raw),
        }
    };
    errors.entry(field.to_string()).or_default().push(message);
    None
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            age: profile.age.to_string(),
            location: profile.location.clone(),
            gender: profile.gender.as_str().to_string(),
            gender_pref: profile.gender_pref.as_str().to_string(),
            from_age: profile.from_age.to_string(),
            to_age: profile.to_age.to_string(),
            about_me: profile.about_me.clone(),
            avatar: profile.avatar.clone(),
        }
    }

    /// Parse and validate the submitted inputs
    ///
    /// Unparseable inputs are reported under their own field name; the
    /// range and cross-field rules run once everything has parsed.
    pub fn clean(&self) -> Result<ProfileChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let age = parse_whole_number(&mut errors, "age", &self.age);
        let gender = parse_gender(&mut errors, "gender", &self.gender);
        let gender_pref = parse_gender(&mut errors, "gender_pref", &self.gender_pref);
        let from_age = parse_whole_number(&mut errors, "from_age", &self.from_age);
        let to_age = parse_whole_number(&mut errors, "to_age", &self.to_age);

        let (Some(age), Some(gender), Some(gender_pref), Some(from_age), Some(to_age)) =
            (age, gender, gender_pref, from_age, to_age)
        else {
            return Err(errors);
        };

        let fields = ProfileFields {
            age,
            location: self.location.clone(),
            gender,
            gender_pref,
            from_age,
            to_age,
            about_me: self.about_me.clone(),
            avatar: self.avatar.clone(),
        };
        fields.validate().map_err(|e| field_errors(&e))?;
        Ok(fields.into_changes())
    }
}

/// User credentials edit form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UserForm {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(length(min = 8, message = "Password must contain at least 8 characters"))]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match"))]
    pub password2: String,
}

/// User form as rendered back to the client, passwords omitted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserFormView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserFormView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

impl From<&UserForm> for UserFormView {
    fn from(form: &UserForm) -> Self {
        Self {
            username: form.username.clone(),
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
        }
    }
}

/// Discovery feed query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
}

/// Login page query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Flatten validator errors into per-field messages
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code))
            })
            .collect();
        out.insert(field.to_string(), messages);
    }
    out
}
