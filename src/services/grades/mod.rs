pub mod list;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::PaginationQuery;
use crate::models::grades::requests::{GradeListQuery, GradeSubmissionRequest};
use crate::services::calendar::CalendarPolicy;
use crate::storage::Storage;

pub use submit::submit_grade;

pub struct GradeService {
    storage: Option<Arc<dyn Storage>>,
    calendar: Option<Arc<CalendarPolicy>>,
}

impl GradeService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            calendar: None,
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_calendar(&self, request: &HttpRequest) -> Arc<CalendarPolicy> {
        if let Some(calendar) = &self.calendar {
            calendar.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<CalendarPolicy>>>()
                .expect("Calendar not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 录入成绩
    pub async fn submit_grade(
        &self,
        request: &HttpRequest,
        submission: GradeSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        submit::handle_submit_grade(self, request, submission).await
    }

    // 列出名册内学生的成绩
    pub async fn list_grades(
        &self,
        request: &HttpRequest,
        query: GradeListQuery,
    ) -> ActixResult<HttpResponse> {
        let pagination = PaginationQuery {
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        };
        list::list_grades(self, request, query.subject_id, pagination).await
    }
}
