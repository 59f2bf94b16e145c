use crate::shared::errors::AppError;

const MAX_QUERY_LENGTH: usize = 200;

pub struct Validator;

impl Validator {
    /// Trim a search query and reject blank or oversized input
    pub fn validate_query(query: &str) -> Result<String, AppError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AppError::ValidationError(
                "Search query cannot be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_QUERY_LENGTH {
            return Err(AppError::ValidationError(format!(
                "Search query too long (max {} characters)",
                MAX_QUERY_LENGTH
            )));
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_page(page: u32) -> Result<(), AppError> {
        if page == 0 {
            return Err(AppError::ValidationError(
                "Page must be 1 or greater".to_string(),
            ));
        }
        Ok(())
    }

    /// Ids are opaque tokens; only blank ones are rejected
    pub fn validate_id(id: &str, what: &str) -> Result<String, AppError> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(AppError::ValidationError(format!(
                "{} cannot be empty",
                what
            )));
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_genre(genre: &str) -> Result<String, AppError> {
        let trimmed = genre.trim();
        if trimmed.is_empty() {
            return Err(AppError::ValidationError(
                "Genre cannot be empty".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}
