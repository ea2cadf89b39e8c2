use crate::data::entity::Entity;
use regex_lite::Regex;
use serde::Deserialize;
use serde_json::Value;
use snafu::{OptionExt, Snafu, ensure};
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ValidationError {
    #[snafu(display("missing required field `{field}`"))]
    MissingField { field: &'static str },
    #[snafu(display("invalid age"))]
    InvalidAge,
    #[snafu(display("invalid email format"))]
    InvalidEmail,
}

// unknown keys like `id` or `createdAt` are dropped, `null` counts as absent
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EntityFields {
    pub name: Option<String>,
    pub age: Option<Value>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord {
    pub name: String,
    pub age: i32,
    pub email: String,
}

pub fn validate_new(fields: EntityFields) -> Result<ValidRecord, ValidationError> {
    let EntityFields { name, age, email } = fields;
    build_record(name, age, email)
}

pub fn validate_update(
    existing: &Entity,
    fields: EntityFields,
) -> Result<ValidRecord, ValidationError> {
    let EntityFields { name, age, email } = fields;

    build_record(
        Some(name.unwrap_or_else(|| existing.name.clone())),
        Some(age.unwrap_or_else(|| Value::from(existing.age))),
        Some(email.unwrap_or_else(|| existing.email.clone())),
    )
}

fn build_record(
    name: Option<String>,
    age: Option<Value>,
    email: Option<String>,
) -> Result<ValidRecord, ValidationError> {
    let name = required_text(name, "name")?;

    let age = match age {
        None | Some(Value::Null) => return MissingFieldSnafu { field: "age" }.fail(),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return MissingFieldSnafu { field: "age" }.fail();
        }
        Some(value) => coerce_age(&value).context(InvalidAgeSnafu)?,
    };

    let email = required_text(email, "email")?.to_lowercase();
    ensure!(EMAIL_PATTERN.is_match(&email), InvalidEmailSnafu);

    Ok(ValidRecord { name, age, email })
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .context(MissingFieldSnafu { field })?;
    Ok(trimmed.to_owned())
}

/// Integers, integral floats and integer strings are accepted; the result must be at least one.
#[allow(clippy::cast_possible_truncation)]
fn coerce_age(value: &Value) -> Option<i32> {
    let age = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 {
                    return None;
                }
                f as i64 //saturates, the range check below rejects it
            }
        },
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    i32::try_from(age).ok().filter(|age| *age >= 1)
}
