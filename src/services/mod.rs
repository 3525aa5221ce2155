pub mod accounts;
pub mod auth;
pub mod calendar;
pub mod grades;
pub mod reports;
pub mod roster;
pub mod teachers;

pub use accounts::AccountProvisioner;
pub use auth::AuthService;
pub use calendar::CalendarPolicy;
pub use grades::GradeService;
pub use reports::ReportService;
pub use teachers::TeacherService;
