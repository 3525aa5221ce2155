pub mod auth;
pub mod common;
pub mod grades;
pub mod parents;
pub mod principals;
pub mod reports;
pub mod school_classes;
pub mod students;
pub mod subjects;
pub mod teachers;

pub use common::pagination::{PaginatedResponse, PaginationInfo, PaginationQuery};
pub use common::response::ApiResponse;

// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

// 统一错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 请求错误
    BadRequest = 1000,
    GradeNotNumeric = 1001,
    GradeOutOfRange = 1002,
    InvalidDate = 1003,
    LoginIdInvalid = 1004,

    // 认证与权限
    Unauthorized = 2000,
    AuthFailed = 2001,
    Forbidden = 2003,

    // 资源不存在
    NotFound = 3000,
    StudentNotFound = 3001,
    SubjectNotFound = 3002,

    // 成绩业务规则
    GradeNotAssigned = 4001,
    SubjectNotOffered = 4002,
    NonInstructionalWeekend = 4101,
    NonInstructionalHoliday = 4102,
    GradeAlreadyExists = 4201,
    RateLimitExceeded = 4290,

    InternalServerError = 5000,
}
