/// リクエストボディのバリデーション
///
/// 必須フィールドの存在確認と、ユーザーリソース固有の
/// メールアドレス形式・パスワード強度・ロールの検証を提供する。
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::field_policy::{FieldPolicy, VALID_USER_ROLES};

/// バリデーションエラー
///
/// メッセージはそのままHTTPレスポンスのエラー本文になる。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// 必須フィールドが欠落または空
    #[error("{0} is required")]
    MissingField(String),
    /// メールアドレスの形式が不正
    #[error("Invalid email format")]
    InvalidEmailFormat,
    /// パスワードが短すぎる
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    /// パスワードに英字が含まれない
    #[error("Password must contain at least one letter")]
    PasswordMissingLetter,
    /// パスワードに数字が含まれない
    #[error("Password must contain at least one number")]
    PasswordMissingNumber,
    /// ロールが許可リスト外
    #[error("Invalid role. Must be one of: {0}")]
    InvalidRole(String),
}

/// 必須フィールドがすべて存在し、空でないことを確認する
///
/// 欠落・null・空文字列を「存在しない」とみなす。
pub fn validate_required_fields(
    policy: &FieldPolicy,
    body: &Map<String, Value>,
) -> Result<(), ValidationError> {
    for field in policy.required {
        let present = match body.get(field.column) {
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        };
        if !present {
            return Err(ValidationError::MissingField(field.label.to_string()));
        }
    }
    Ok(())
}

/// メールアドレスの形式を検証する
///
/// local@domain.tld 構造の確認のみ（完全なRFC準拠ではない）:
/// - `@`がちょうど1つ、ローカル部が空でない
/// - ドメイン部に`.`があり、各ラベルが空でない
/// - 末尾ラベルが2文字以上の英字
/// - 空白を含まない
pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::InvalidEmailFormat);
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(ValidationError::InvalidEmailFormat),
    };

    if local.is_empty() || domain.is_empty() {
        return Err(ValidationError::InvalidEmailFormat);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(ValidationError::InvalidEmailFormat);
    }

    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidEmailFormat);
    }

    Ok(())
}

/// パスワード強度を検証する（8文字以上、英字と数字を各1つ以上）
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::PasswordMissingLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingNumber);
    }
    Ok(())
}

/// ユーザーロールが許可リストに含まれることを検証する
pub fn validate_user_role(role: &str) -> Result<(), ValidationError> {
    if !VALID_USER_ROLES.contains(&role) {
        return Err(ValidationError::InvalidRole(VALID_USER_ROLES.join(", ")));
    }
    Ok(())
}
