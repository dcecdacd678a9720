use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// 表情生成过程中的领域错误，每种错误自带状态码。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemeError {
    #[error("No such meme with key=\"{0}\"")]
    NoSuchMeme(String),

    #[error("Text \"{0}\" is too long!")]
    TextOverLength(String),

    #[error("Error opening images: {0}")]
    OpenImageFailed(String),

    #[error("The number of images is incorrect, it should be {}", count_range(.min, .max))]
    ImageNumberMismatch { min: u32, max: u32 },

    #[error("The number of texts is incorrect, it should be {}", count_range(.min, .max))]
    TextNumberMismatch { min: u32, max: u32 },

    #[error("{0}")]
    ArgMismatch(String),

    #[error("{0}")]
    ArgModelMismatch(String),

    #[error("Meme generation failed: {0}")]
    Render(String),
}

fn count_range(min: &u32, max: &u32) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{} ~ {}", min, max)
    }
}

impl MemeError {
    pub fn status_code(&self) -> u16 {
        match self {
            MemeError::Render(_) => 520,
            MemeError::NoSuchMeme(_) => 531,
            MemeError::TextOverLength(_) => 532,
            MemeError::OpenImageFailed(_) => 533,
            MemeError::ImageNumberMismatch { .. } => 541,
            MemeError::TextNumberMismatch { .. } => 542,
            MemeError::ArgMismatch(_) => 550,
            MemeError::ArgModelMismatch(_) => 552,
        }
    }
}

impl From<image::ImageError> for MemeError {
    fn from(e: image::ImageError) -> Self {
        MemeError::Render(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Meme(#[from] MemeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Meme(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && !matches!(self, AppError::Meme(_)) {
            tracing::error!(status = %status, "请求处理失败: {}", self);
        }

        // 与 FastAPI 的 HTTPException 响应体保持一致
        let body = Json(json!({
            "detail": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
