pub mod aggregate;
pub mod view;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::storage::Storage;

pub struct ReportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReportService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
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

    // 学生查看自己的报告
    pub async fn get_own_report(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        view::handle_own_report(self, request).await
    }

    // 家长查看孩子的报告
    pub async fn get_parent_report(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        view::handle_parent_report(self, request).await
    }

    // 教师查看名册内学生的报告
    pub async fn get_student_report(
        &self,
        request: &HttpRequest,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        view::handle_teacher_student_report(self, request, student_id).await
    }
}
