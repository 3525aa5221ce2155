pub mod overview;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::storage::Storage;

pub struct TeacherService {
    storage: Option<Arc<dyn Storage>>,
}

impl TeacherService {
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

    // 任教科目与班级
    pub async fn get_overview(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        overview::handle_overview(request).await
    }

    // 按班级分组的学生名单
    pub async fn get_roster(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        overview::handle_roster(self, request).await
    }
}
