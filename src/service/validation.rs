//! Field validation for student input. Runs before any store interaction.

use crate::config::ValidationPolicy;
use crate::error::{AppError, FieldViolation};
use crate::model::{StudentFields, StudentInput};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const CGPA_MIN: f64 = 0.0;
const CGPA_MAX: f64 = 10.0;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
            .expect("email pattern compiles")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[6-9][0-9]{9}$").expect("phone pattern compiles"))
}

/// Check every field of `input` and return the violations in field order,
/// at most one per field. An empty result means the input is valid.
/// `today` is the reference date for the date-of-birth rule.
pub fn validate(input: &StudentInput, policy: &ValidationPolicy, today: NaiveDate) -> Vec<FieldViolation> {
    let mut out = Vec::new();

    check_name(&mut out, "firstName", "First name", input.first_name.as_deref());
    check_name(&mut out, "lastName", "Last name", input.last_name.as_deref());

    match non_blank(input.email.as_deref()) {
        None => out.push(FieldViolation::new("email", "Email is required")),
        Some(email) if !email_regex().is_match(email) => {
            out.push(FieldViolation::new("email", "Invalid email format"))
        }
        Some(_) => {}
    }

    match non_blank(input.phone.as_deref()) {
        None if policy.phone_required => out.push(FieldViolation::new("phone", "Phone number is required")),
        None => {}
        Some(phone) if !phone_regex().is_match(phone) => out.push(FieldViolation::new(
            "phone",
            "Phone number must be valid Indian number",
        )),
        Some(_) => {}
    }

    match input.date_of_birth {
        None => out.push(FieldViolation::new("dateOfBirth", "Date of birth is required")),
        Some(dob) if dob >= today => out.push(FieldViolation::new("dateOfBirth", "DOB must be in the past")),
        Some(_) => {}
    }

    if non_blank(input.department.as_deref()).is_none() {
        out.push(FieldViolation::new("department", "Department is required"));
    }

    match input.year {
        None => out.push(FieldViolation::new("year", "Academic year is required")),
        Some(y) if !(ValidationPolicy::MIN_YEAR..=policy.max_year).contains(&y) => out.push(FieldViolation::new(
            "year",
            format!(
                "Academic year must be between {} and {}",
                ValidationPolicy::MIN_YEAR,
                policy.max_year
            ),
        )),
        Some(_) => {}
    }

    match input.cgpa {
        None => out.push(FieldViolation::new("cgpa", "CGPA is required")),
        Some(c) if !c.is_finite() || !(CGPA_MIN..=CGPA_MAX).contains(&c) => out.push(FieldViolation::new(
            "cgpa",
            format!("CGPA must be between {:.1} and {:.1}", CGPA_MIN, CGPA_MAX),
        )),
        Some(_) => {}
    }

    out
}

/// Validate and convert into the mutable field set. Strings are trimmed.
pub fn into_fields(input: StudentInput, policy: &ValidationPolicy, today: NaiveDate) -> Result<StudentFields, AppError> {
    let violations = validate(&input, policy, today);
    if !violations.is_empty() {
        return Err(AppError::validation(violations));
    }
    let trimmed = |s: String| s.trim().to_string();
    match (
        input.first_name,
        input.last_name,
        input.email,
        input.date_of_birth,
        input.department,
        input.year,
        input.cgpa,
    ) {
        (Some(first_name), Some(last_name), Some(email), Some(date_of_birth), Some(department), Some(year), Some(cgpa)) => {
            Ok(StudentFields {
                first_name: trimmed(first_name),
                last_name: trimmed(last_name),
                email: trimmed(email),
                phone: input.phone.map(trimmed).filter(|p| !p.is_empty()),
                date_of_birth,
                department: trimmed(department),
                year,
                cgpa,
            })
        }
        _ => Err(AppError::BadRequest("incomplete student record".into())),
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn check_name(out: &mut Vec<FieldViolation>, field: &'static str, label: &str, value: Option<&str>) {
    match non_blank(value) {
        None => out.push(FieldViolation::new(field, format!("{} is required", label))),
        Some(s) => {
            let len = s.chars().count();
            if !(NAME_MIN..=NAME_MAX).contains(&len) {
                out.push(FieldViolation::new(
                    field,
                    format!("{} must be between {} and {} characters", label, NAME_MIN, NAME_MAX),
                ));
            }
        }
    }
}
