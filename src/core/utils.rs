use unicode_segmentation::UnicodeSegmentation;

use super::AppError;

const MAX_DISPLAY_NAME_LENGTH: usize = 256;
const FORBIDDEN_NAME_CHARACTERS: [char; 9] = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NameValidationError {
    #[error("display name must not be empty")]
    Empty,
    #[error("display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters")]
    TooLong,
    #[error("display name contains a forbidden character")]
    ForbiddenCharacter,
}

impl From<NameValidationError> for AppError {
    fn from(error: NameValidationError) -> Self {
        AppError::validation_error(error)
    }
}

pub fn validate_display_name(name: &str) -> Result<(), NameValidationError> {
    if name.trim().is_empty() {
        return Err(NameValidationError::Empty);
    }
    if name.graphemes(true).count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(NameValidationError::TooLong);
    }
    if name.chars().any(|c| FORBIDDEN_NAME_CHARACTERS.contains(&c)) {
        return Err(NameValidationError::ForbiddenCharacter);
    }
    Ok(())
}
