use serde::Serialize;

// 统一API响应结构
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    /// Only populated in development mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub timestamp: String,
}

#[derive(Serialize, Default)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total_count: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total_count + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

// 便捷构造函数
impl<T> ApiResponse<T> {
    fn build(success: bool, code: u16, message: &str) -> Self {
        Self {
            success,
            code,
            message: message.to_string(),
            data: None,
            meta: None,
            errors: None,
            stack: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn failure(code: u16, message: &str, error_code: &str) -> Self {
        let mut response = Self::build(false, code, message);
        response.errors = Some(vec![ErrorDetail {
            field: None,
            code: error_code.to_string(),
            message: message.to_string(),
        }]);
        response
    }

    pub fn success(data: T, message: &str) -> Self {
        let mut response = Self::build(true, 200, message);
        response.data = Some(data);
        response
    }

    pub fn success_with_meta(data: T, message: &str, meta: ResponseMeta) -> Self {
        let mut response = Self::success(data, message);
        response.meta = Some(meta);
        response
    }

    pub fn created(data: T, message: &str) -> Self {
        let mut response = Self::build(true, 201, message);
        response.data = Some(data);
        response
    }

    pub fn ok(message: &str) -> Self {
        Self::build(true, 200, message)
    }

    pub fn error(code: u16, message: &str, errors: Vec<ErrorDetail>) -> Self {
        let mut response = Self::build(false, code, message);
        response.errors = Some(errors);
        response
    }

    pub fn validation_error(errors: Vec<ErrorDetail>) -> Self {
        Self::error(422, "Validation failed", errors)
    }

    pub fn unprocessable(message: &str) -> Self {
        Self::failure(422, message, "VALIDATION_ERROR")
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::failure(401, message, "UNAUTHORIZED")
    }

    pub fn forbidden(message: &str) -> Self {
        Self::failure(403, message, "FORBIDDEN")
    }

    pub fn not_found(message: &str) -> Self {
        Self::failure(404, message, "NOT_FOUND")
    }

    pub fn not_acceptable(message: &str) -> Self {
        Self::failure(406, message, "NOT_ACCEPTABLE")
    }

    pub fn gone(message: &str) -> Self {
        Self::failure(410, message, "TOKEN_EXPIRED")
    }

    pub fn conflict(message: &str, field: Option<String>, error_code: &str) -> Self {
        let mut response = Self::build(false, 409, message);
        response.errors = Some(vec![ErrorDetail {
            field,
            code: error_code.to_string(),
            message: message.to_string(),
        }]);
        response
    }

    pub fn bad_gateway(message: &str) -> Self {
        Self::failure(502, message, "EXTERNAL_SERVICE_ERROR")
    }

    pub fn internal_error(message: &str) -> Self {
        Self::failure(500, message, "INTERNAL_ERROR")
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

// 业务错误码常量
pub mod error_codes {
    pub const USER_EMAIL_EXISTS: &str = "USER_001";
    pub const BOARD_ALREADY_MEMBER: &str = "BOARD_001";
    pub const INVITATION_PENDING: &str = "INVITATION_001";
}
