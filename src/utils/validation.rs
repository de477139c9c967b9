use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("valid username regex")
});

/// 验证用户名格式（字母、数字以及 @ . + - _）
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("用户名不能为空".to_string()));
    }

    if username.chars().count() > 150 {
        return Err(AppError::Validation("用户名不能超过150个字符".to_string()));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::Validation(
            "用户名只能包含字母、数字以及 @ . + - _".to_string(),
        ));
    }

    Ok(())
}

/// 文本字段不能为空或只包含空白字符
pub fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("This field is required"));
        return Err(error);
    }

    Ok(())
}

/// 空白的可选字段视为未填写
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
