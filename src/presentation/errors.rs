// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 请求参数错误
#[derive(Error, Debug)]
pub enum RequestError {
    /// 缺少 `url` 参数，附带返回给客户端的提示文本
    #[error("{0}")]
    MissingUrl(String),
}

/// 应用错误类型
///
/// 封装处理器中的所有错误，统一转换为 `{"error": ...}` 响应
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<RequestError>() {
            Some(RequestError::MissingUrl(_)) => StatusCode::BAD_REQUEST,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
