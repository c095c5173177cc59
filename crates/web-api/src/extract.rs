use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

/// 调用方在 `user` 请求头中声明的名称
pub const CALLER_HEADER: &str = "user";

/// 调用方名称，按原样取值；缺失或不是合法 UTF-8 时为空字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerName(pub String);

impl CallerName {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let name = headers
            .get(CALLER_HEADER)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .map(str::to_owned)
            .unwrap_or_default();
        Self(name)
    }
}

impl<S> FromRequestParts<S> for CallerName
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
