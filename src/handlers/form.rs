use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Query, Request},
    http::header,
    Form,
};

use crate::utils::error::AppError;

/// `POST /memes/{key}/` 的请求内容。
///
/// 支持 `multipart/form-data`（图片、文字、参数）与
/// `application/x-www-form-urlencoded`（文字、参数），文字也可以通过
/// 查询参数 `texts` 重复传入。
#[derive(Debug, Default)]
pub struct MemeForm {
    pub images: Vec<Vec<u8>>,
    /// `None` 表示请求中完全没有提供文字，此时使用表情的默认文字
    pub texts: Option<Vec<String>>,
    pub args: Option<String>,
}

impl MemeForm {
    fn push_text(&mut self, text: String) {
        self.texts.get_or_insert_with(Vec::new).push(text);
    }

    fn push_pair(&mut self, name: &str, value: String) {
        match name {
            "texts" => self.push_text(value),
            "args" => self.args = Some(value),
            _ => {}
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for MemeForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut form = MemeForm::default();

        let Query(query): Query<Vec<(String, String)>> = Query::try_from_uri(req.uri())
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        for (name, value) in query {
            if name == "texts" {
                form.push_text(value);
            }
        }

        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                if name == "images" {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.images.push(bytes.to_vec());
                } else {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.push_pair(&name, value);
                }
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs): Form<Vec<(String, String)>> = Form::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            for (name, value) in pairs {
                form.push_pair(&name, value);
            }
        }

        Ok(form)
    }
}
