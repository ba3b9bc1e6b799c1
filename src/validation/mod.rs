pub mod upload;

use axum::{
    async_trait,
    extract::FromRequest,
    http::Request,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::{db::models::api::ErrorDetail, error::AppError};

/// 验证的 JSON 提取器
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    B: axum::body::HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<axum::BoxError>,
{
    type Rejection = AppError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(format!("Invalid JSON body: {}", rejection)))?;

        value
            .validate()
            .map_err(|errors| AppError::ValidationFailed(error_details(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// Flattens validator errors into envelope error details, nested structs included.
pub fn error_details(errors: &ValidationErrors) -> Vec<ErrorDetail> {
    let mut details = Vec::new();
    collect_details(None, errors, &mut details);
    details
}

fn collect_details(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<ErrorDetail>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, field),
            None => field.to_string(),
        };
        match kind {
            validator::ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(ErrorDetail {
                        field: Some(path.clone()),
                        code: error.code.to_string(),
                        message: error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Validation failed for field: {}", path)),
                    });
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => {
                collect_details(Some(&path), nested, out);
            }
            validator::ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_details(Some(&format!("{}[{}]", path, index)), nested, out);
                }
            }
        }
    }
}

/// 常用验证规则
pub mod rules {
    use validator::ValidationError;

    use crate::db::enums::InvitationStatus;

    fn with_message(code: &'static str, message: &'static str) -> ValidationError {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        error
    }

    /// At least 8 characters with at least one letter and one digit.
    pub fn validate_password_rule(password: &str) -> Result<(), ValidationError> {
        let long_enough = password.chars().count() >= 8 && password.chars().count() <= 256;
        let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());

        if !(long_enough && has_letter && has_digit) {
            return Err(with_message(
                "password_rule",
                "Password must include at least 1 letter, a number, and at least 8 characters",
            ));
        }
        Ok(())
    }

    pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > 50 {
            return Err(with_message(
                "display_name_length",
                "Display name must be between 1 and 50 characters",
            ));
        }
        Ok(())
    }

    /// Lengths are counted on the trimmed value, which is what gets stored.
    fn trimmed_length(
        value: &str,
        min: usize,
        max: usize,
        code: &'static str,
        message: &'static str,
    ) -> Result<(), ValidationError> {
        let count = value.trim().chars().count();
        if count < min || count > max {
            return Err(with_message(code, message));
        }
        Ok(())
    }

    /// Board, column and card titles.
    pub fn validate_title(title: &str) -> Result<(), ValidationError> {
        trimmed_length(title, 3, 50, "title_length", "Title must be between 3 and 50 characters")
    }

    pub fn validate_board_description(description: &str) -> Result<(), ValidationError> {
        trimmed_length(
            description,
            3,
            256,
            "description_length",
            "Description must be between 3 and 256 characters",
        )
    }

    pub fn validate_card_description(description: &str) -> Result<(), ValidationError> {
        trimmed_length(description, 0, 5000, "description_length", "Description is too long")
    }

    pub fn validate_label_title(title: &str) -> Result<(), ValidationError> {
        trimmed_length(
            title,
            1,
            30,
            "label_title_length",
            "Label title must be between 1 and 30 characters",
        )
    }

    pub fn validate_checklist_title(title: &str) -> Result<(), ValidationError> {
        trimmed_length(
            title,
            1,
            100,
            "checklist_title_length",
            "Checklist title must be between 1 and 100 characters",
        )
    }

    pub fn validate_checklist_item_text(text: &str) -> Result<(), ValidationError> {
        trimmed_length(
            text,
            1,
            256,
            "item_text_length",
            "Item text must be between 1 and 256 characters",
        )
    }

    pub fn validate_comment(content: &str) -> Result<(), ValidationError> {
        trimmed_length(
            content,
            1,
            10000,
            "comment_length",
            "Comment must be between 1 and 10000 characters",
        )
    }

    /// Invitations are answered with `accepted` or `rejected`.
    pub fn validate_invitation_answer(status: &InvitationStatus) -> Result<(), ValidationError> {
        if *status == InvitationStatus::Pending {
            return Err(with_message(
                "invitation_answer",
                "status must be accepted or rejected",
            ));
        }
        Ok(())
    }

    /// `#RRGGBB`
    pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
        if !color.starts_with('#')
            || color.len() != 7
            || !color.chars().skip(1).all(|c| c.is_ascii_hexdigit())
        {
            return Err(with_message("hex_color", "Color must be hex like #RRGGBB"));
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn password_rule() {
            assert!(validate_password_rule("abcdefg1").is_ok());
            assert!(validate_password_rule("abcdefgh").is_err());
            assert!(validate_password_rule("12345678").is_err());
            assert!(validate_password_rule("a1").is_err());
        }

        #[test]
        fn hex_color() {
            assert!(validate_hex_color("#FF00aa").is_ok());
            assert!(validate_hex_color("FF00AA").is_err());
            assert!(validate_hex_color("#FF00A").is_err());
            assert!(validate_hex_color("#GG00AA").is_err());
        }

        #[test]
        fn title_is_measured_after_trimming() {
            assert!(validate_title("Roadmap").is_ok());
            assert!(validate_title("  a  ").is_err());
            assert!(validate_title("   ab   ").is_err());
            assert!(validate_title(&format!("  {}  ", "x".repeat(50))).is_ok());
            assert!(validate_title(&"x".repeat(51)).is_err());
            assert_eq!(
                validate_title(" a ").unwrap_err().code,
                "title_length"
            );
        }

        #[test]
        fn whitespace_only_text_is_rejected() {
            assert!(validate_board_description("      ").is_err());
            assert!(validate_board_description(" ok! ").is_ok());
            assert!(validate_label_title("   ").is_err());
            assert!(validate_checklist_title("\t\n").is_err());
            assert!(validate_checklist_item_text("  ").is_err());
            assert!(validate_comment("   ").is_err());
            assert!(validate_card_description("   ").is_ok());
            assert!(validate_card_description(&"x".repeat(5001)).is_err());
        }

        #[test]
        fn invitation_answer() {
            assert!(validate_invitation_answer(&InvitationStatus::Accepted).is_ok());
            assert!(validate_invitation_answer(&InvitationStatus::Rejected).is_ok());
            assert!(validate_invitation_answer(&InvitationStatus::Pending).is_err());
        }

        #[test]
        fn display_name() {
            assert!(validate_display_name("Ada").is_ok());
            assert!(validate_display_name("   ").is_err());
            assert!(validate_display_name(&"x".repeat(51)).is_err());
        }
    }
}
