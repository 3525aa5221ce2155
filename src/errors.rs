//! 统一错误处理模块
//!
//! 基础设施层错误由宏生成，每个变体带有错误代码和类型名称。
//! 成绩提交的业务错误见 `models::grades::errors`。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_gradebook_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum GradebookError {
            $($variant(String),)*
        }

        impl GradebookError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(GradebookError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(GradebookError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(GradebookError::$variant(msg) => msg,)*
                }
            }
        }

        paste::paste! {
            impl GradebookError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        GradebookError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_gradebook_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E011", "Date Parse Error"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
    Duplicate("E014", "Duplicate Record"),
    IdExhausted("E015", "Identifier Space Exhausted"),
}

impl GradebookError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, GradebookError::Duplicate(_))
    }
}

impl fmt::Display for GradebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GradebookError {}

impl From<sea_orm::DbErr> for GradebookError {
    fn from(err: sea_orm::DbErr) -> Self {
        // 唯一约束冲突单独归类，调用方据此判定重复记录
        if let Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return GradebookError::Duplicate(detail);
        }
        GradebookError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for GradebookError {
    fn from(err: std::io::Error) -> Self {
        GradebookError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GradebookError {
    fn from(err: serde_json::Error) -> Self {
        GradebookError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for GradebookError {
    fn from(err: chrono::ParseError) -> Self {
        GradebookError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;
