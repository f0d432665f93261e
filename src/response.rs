use serde::Serialize;
use utoipa::ToSchema;

/// Pagination block attached to list responses. All three fields are
/// absent on single-resource and error responses.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Error payload carried in the `data` slot of a failed response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Envelope every endpoint answers with, success or failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    /// List response with the pagination block filled in.
    pub fn paginated(message: impl Into<String>, data: T, page: i64, per_page: i64, total: i64) -> Self {
        Self::success(message, data, Some(Meta::new(page, per_page, total)))
    }
}

impl ApiResponse<ErrorBody> {
    /// Failed response; the message doubles as the error body.
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            data: Some(ErrorBody {
                error: message.clone(),
            }),
            message,
            meta: Some(Meta::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_fills_the_meta_block() {
        let resp = ApiResponse::paginated("Products", vec![1, 2, 3], 2, 20, 43);
        let meta = resp.meta.expect("meta");
        assert_eq!(meta.page, Some(2));
        assert_eq!(meta.per_page, Some(20));
        assert_eq!(meta.total, Some(43));
    }

    #[test]
    fn error_carries_the_message_in_both_slots() {
        let resp = ApiResponse::error("Not Found");
        assert_eq!(resp.message, "Not Found");
        assert_eq!(resp.data.expect("body").error, "Not Found");
    }
}
