//! Calendar repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::Calendar;
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CalendarRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Calendar>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, public_only: bool, pagination: Pagination) -> Result<Page<Calendar>, DomainError>;
    async fn create(&self, calendar: &Calendar) -> Result<Calendar, DomainError>;
    async fn update(&self, calendar: &Calendar) -> Result<Calendar, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}
