use validator::Validate;

use crate::api::errors::ApiError;
use crate::services::scoring::label_to_index;

pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|err| ApiError::BadRequest(err.to_string()))
}

/// Correct-option labels must address existing options ("A".. up to the
/// option count).
pub(crate) fn validate_correct_options(
    options: &[String],
    correct_options: &[String],
) -> Result<(), ApiError> {
    for label in correct_options {
        let index = label_to_index(label).ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid correct option label '{label}'"))
        })?;
        if index >= options.len() {
            return Err(ApiError::BadRequest(format!(
                "Correct option '{label}' is out of range for {} options",
                options.len()
            )));
        }
    }
    Ok(())
}
