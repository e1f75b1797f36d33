//! 请求字段校验
//!
//! 由 `validator` 派生宏调用，错误信息会原样出现在响应的字段错误里。

use std::borrow::Cow;

use validator::ValidationError;

/// 名称类字段：科室、楼宇、诊室、患者姓名
pub const MAX_NAME_LEN: u64 = 200;

/// 备注、诊断等长文本
pub const MAX_NOTE_LEN: u64 = 1000;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// 必填且不能全是空白
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", "this field is required"));
    }
    Ok(())
}

/// `#RRGGBB`
pub fn hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(error("color", "color must look like #RRGGBB"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(non_blank("").is_err());
        assert!(non_blank("   ").is_err());
        assert!(non_blank("OPD").is_ok());
    }

    #[test]
    fn colors_need_six_hex_digits() {
        assert!(hex_color("#1976d2").is_ok());
        assert!(hex_color("#FFF").is_err());
        assert!(hex_color("1976d2f").is_err());
        assert!(hex_color("#19z6d2").is_err());
    }
}
