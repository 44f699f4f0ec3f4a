use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, Result};
use crate::models::design::{ContainerParams, DesignParams, PoolParams};
use crate::models::project::{PROJECT_STATUSES, PROJECT_TYPES};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
static MEDIDAS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,4}\s*x\s*\d{1,4}$").unwrap());

pub struct Validator;

impl Validator {
    pub fn validate_email(email: &str) -> Result<()> {
        if !EMAIL_RE.is_match(email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }
        if email.len() > 254 {
            return Err(AppError::ValidationError("Email too long".to_string()));
        }
        Ok(())
    }

    pub fn validate_username(username: &str) -> Result<()> {
        if username.len() < 3 {
            return Err(AppError::ValidationError(
                "Username must be at least 3 characters long".to_string(),
            ));
        }
        if username.len() > 30 {
            return Err(AppError::ValidationError(
                "Username must be less than 30 characters".to_string(),
            ));
        }
        if !USERNAME_RE.is_match(username) {
            return Err(AppError::ValidationError(
                "Username can only contain letters, numbers, underscores, and hyphens".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<()> {
        if password.len() < 8 {
            return Err(AppError::ValidationError(
                "Password must be at least 8 characters long".to_string(),
            ));
        }
        if password.len() > 128 {
            return Err(AppError::ValidationError(
                "Password must be less than 128 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_project_type(project_type: &str) -> Result<()> {
        if !PROJECT_TYPES.contains(&project_type) {
            return Err(AppError::ValidationError(format!(
                "Unknown project type '{}'",
                project_type
            )));
        }
        Ok(())
    }

    pub fn validate_project_status(status: &str) -> Result<()> {
        if !PROJECT_STATUSES.contains(&status) {
            return Err(AppError::ValidationError(format!(
                "Unknown project status '{}'",
                status
            )));
        }
        Ok(())
    }

    pub fn validate_design_params(params: &DesignParams) -> Result<()> {
        Self::validate_project_type(&params.tipo)?;
        for (field, value) in [
            ("material", &params.material),
            ("color", &params.color),
            ("estilo", &params.estilo),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::ValidationError(format!("Field '{}' is required", field)));
            }
        }
        if let Some(medidas) = &params.medidas {
            if !MEDIDAS_RE.is_match(medidas.trim()) {
                return Err(AppError::ValidationError(
                    "Field 'medidas' must look like '80x200'".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn validate_container_params(params: &ContainerParams) -> Result<()> {
        for (field, value) in [("uso", &params.uso), ("dimensiones", &params.dimensiones)] {
            if value.trim().is_empty() {
                return Err(AppError::ValidationError(format!("Field '{}' is required", field)));
            }
        }
        Ok(())
    }

    pub fn validate_pool_params(params: &PoolParams) -> Result<()> {
        for (field, value) in [("forma", &params.forma), ("tamano", &params.tamano)] {
            if value.trim().is_empty() {
                return Err(AppError::ValidationError(format!("Field '{}' is required", field)));
            }
        }
        Ok(())
    }

    pub fn validate_contact(name: &str, subject: &str, message: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        if subject.trim().is_empty() || subject.len() > 200 {
            return Err(AppError::ValidationError(
                "Subject is required and must be under 200 characters".to_string(),
            ));
        }
        if message.trim().is_empty() || message.len() > 5000 {
            return Err(AppError::ValidationError(
                "Message is required and must be under 5000 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DesignParams {
        DesignParams {
            tipo: "puerta".to_string(),
            material: "roble".to_string(),
            color: "blanco".to_string(),
            estilo: "moderno".to_string(),
            medidas: Some("80x200".to_string()),
            extra: None,
        }
    }

    #[test]
    fn accepts_valid_design_params() {
        assert!(Validator::validate_design_params(&params()).is_ok());
    }

    #[test]
    fn rejects_unknown_project_type() {
        let mut p = params();
        p.tipo = "nave espacial".to_string();
        assert!(Validator::validate_design_params(&p).is_err());
    }

    #[test]
    fn rejects_malformed_dimensions() {
        let mut p = params();
        p.medidas = Some("ochenta por doscientos".to_string());
        assert!(Validator::validate_design_params(&p).is_err());
        p.medidas = Some("80 x 200".to_string());
        assert!(Validator::validate_design_params(&p).is_ok());
    }

    #[test]
    fn email_and_username_rules() {
        assert!(Validator::validate_email("a@b.co").is_ok());
        assert!(Validator::validate_email("not-an-email").is_err());
        assert!(Validator::validate_username("kasa_user-1").is_ok());
        assert!(Validator::validate_username("no").is_err());
        assert!(Validator::validate_username("bad name").is_err());
    }
}
