pub mod auth;

pub mod grades;

pub mod reports;

pub mod teachers;

pub use auth::configure_auth_routes;
pub use grades::configure_grades_routes;
pub use reports::configure_reports_routes;
pub use teachers::configure_teachers_routes;
