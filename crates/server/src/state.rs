use axum::extract::FromRef;

use crate::service::SelectionService;

#[derive(Clone)]
pub struct AppState {
    pub service: SelectionService,
}

impl AppState {
    pub fn new(service: SelectionService) -> Self {
        Self { service }
    }
}

impl FromRef<AppState> for SelectionService {
    fn from_ref(input: &AppState) -> Self {
        input.service.clone()
    }
}
