//! CRM: customers, deals and the sales pipeline
//!
//! The CRM is a staff tool, so every call requires workspace membership.
//! Deleting records needs the editor role.

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::types::{Page, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Customer, CustomerFilter, CustomerUpdate, Deal, DealFilter, DealUpdate, MoveDealStage, NewCustomer,
    NewDeal, StageSummary, WorkspaceRole,
};
use crate::error::DomainError;
use crate::repositories::{CustomerRepository, DealRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct CrmService {
    customers: Arc<dyn CustomerRepository>,
    deals: Arc<dyn DealRepository>,
    access: WorkspaceAccess,
}

impl CrmService {
    pub fn new(customers: Arc<dyn CustomerRepository>, deals: Arc<dyn DealRepository>, access: WorkspaceAccess) -> Self {
        Self { customers, deals, access }
    }

    // ---- customers ----

    pub async fn create_customer(&self, workspace_id: Uuid, user_id: Uuid, input: NewCustomer) -> Result<Customer, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        input.check()?;

        let customer = self.customers.create(&Customer::create(workspace_id, input, user_id)).await?;
        info!(customer_id = %customer.id, %workspace_id, "Customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Customer, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.load_customer(workspace_id, id).await
    }

    pub async fn list_customers(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        filter: CustomerFilter,
        pagination: Pagination,
    ) -> Result<Page<Customer>, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.customers.list(&workspace_id, &filter, pagination).await
    }

    pub async fn update_customer(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: CustomerUpdate,
    ) -> Result<Customer, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        input.check()?;

        let mut customer = self.load_customer(workspace_id, id).await?;
        customer.apply(input);
        let customer = self.customers.update(&customer).await?;
        info!(customer_id = %id, stage = %customer.lifecycle_stage, "Customer updated");
        Ok(customer)
    }

    pub async fn delete_customer(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load_customer(workspace_id, id).await?;
        self.customers.delete(&id).await?;
        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    // ---- deals ----

    pub async fn create_deal(&self, workspace_id: Uuid, user_id: Uuid, input: NewDeal) -> Result<Deal, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        let mut errors = input.field_errors();
        let customer = self.customers.find_by_id(&input.customer_id).await?;
        if in_workspace(customer, workspace_id, input.customer_id).is_err() {
            errors.add("customer_id", "Customer does not exist in this workspace");
        }
        errors.into_result()?;

        let deal = self.deals.create(&Deal::create(workspace_id, input, user_id)).await?;
        info!(deal_id = %deal.id, customer_id = %deal.customer_id, stage = %deal.stage, "Deal created");
        Ok(deal)
    }

    pub async fn get_deal(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Deal, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.load_deal(workspace_id, id).await
    }

    pub async fn list_deals(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        filter: DealFilter,
        pagination: Pagination,
    ) -> Result<Page<Deal>, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.deals.list(&workspace_id, &filter, pagination).await
    }

    pub async fn update_deal(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: DealUpdate) -> Result<Deal, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        input.check()?;

        let mut deal = self.load_deal(workspace_id, id).await?;
        deal.apply(input);
        let deal = self.deals.update(&deal).await?;
        info!(deal_id = %id, "Deal updated");
        Ok(deal)
    }

    pub async fn delete_deal(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load_deal(workspace_id, id).await?;
        self.deals.delete(&id).await?;
        info!(deal_id = %id, "Deal deleted");
        Ok(())
    }

    /// Moves a deal along the pipeline. Winning it promotes the customer to
    /// the `customer` lifecycle stage in the same write.
    pub async fn move_stage(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: MoveDealStage) -> Result<Deal, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;

        let mut deal = self.load_deal(workspace_id, id).await?;
        let from = deal.stage;
        deal.move_to(input.stage, Utc::now())?;

        let deal = if deal.is_won() {
            // The customer must still exist before anything is written
            self.load_customer(workspace_id, deal.customer_id).await?;
            let deal = self.deals.update_won(&deal).await?;
            info!(deal_id = %id, customer_id = %deal.customer_id, "Deal won, customer promoted");
            deal
        } else {
            self.deals.update(&deal).await?
        };

        info!(deal_id = %id, %from, to = %deal.stage, "Deal stage changed");
        Ok(deal)
    }

    /// Count and total per stage, every stage present in pipeline order.
    pub async fn pipeline_summary(&self, workspace_id: Uuid, user_id: Uuid) -> Result<Vec<StageSummary>, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        let rows = self.deals.pipeline_summary(&workspace_id).await?;
        Ok(StageSummary::complete(rows))
    }

    async fn load_customer(&self, workspace_id: Uuid, id: Uuid) -> Result<Customer, DomainError> {
        in_workspace(self.customers.find_by_id(&id).await?, workspace_id, id)
    }

    async fn load_deal(&self, workspace_id: Uuid, id: Uuid) -> Result<Deal, DomainError> {
        in_workspace(self.deals.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LifecycleStage, PipelineStage};
    use crate::repositories::{MockCustomerRepository, MockDealRepository};
    use crate::services::testing::access;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::FirstName;
    use fake::Fake;

    fn customer(workspace_id: Uuid) -> Customer {
        Customer::create(
            workspace_id,
            NewCustomer {
                first_name: FirstName().fake(),
                last_name: None,
                email: SafeEmail().fake(),
                phone: None,
                company: None,
                lifecycle_stage: LifecycleStage::Prospect,
                notes: None,
            },
            Uuid::new_v4(),
        )
    }

    fn new_deal(customer_id: Uuid, stage: PipelineStage) -> NewDeal {
        NewDeal {
            customer_id,
            title: "Festival sponsorship".into(),
            amount_cents: 500_000,
            currency: "USD".into(),
            stage,
            expected_close_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_deal_customer_must_be_in_workspace() {
        let ws = Uuid::new_v4();
        let foreign = customer(Uuid::new_v4());
        let foreign_id = foreign.id;
        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_id().returning(move |_| Ok(Some(foreign.clone())));
        let mut deals = MockDealRepository::new();
        deals.expect_create().never();
        let service = CrmService::new(Arc::new(customers), Arc::new(deals), access(Some(WorkspaceRole::Member)));

        match service.create_deal(ws, Uuid::new_v4(), new_deal(foreign_id, PipelineStage::Lead)).await {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("customer_id")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_winning_deal_promotes_customer() {
        let ws = Uuid::new_v4();
        let customer = customer(ws);
        let deal = Deal::create(ws, new_deal(customer.id, PipelineStage::Negotiation), Uuid::new_v4());
        let deal_id = deal.id;

        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_id().returning(move |_| Ok(Some(customer.clone())));
        customers.expect_update().never();
        let mut deals = MockDealRepository::new();
        deals.expect_find_by_id().returning(move |_| Ok(Some(deal.clone())));
        deals.expect_update().never();
        deals
            .expect_update_won()
            .withf(|d| d.stage == PipelineStage::ClosedWon)
            .times(1)
            .returning(|d| Ok(d.clone()));
        let service = CrmService::new(Arc::new(customers), Arc::new(deals), access(Some(WorkspaceRole::Member)));

        let won = service
            .move_stage(ws, deal_id, Uuid::new_v4(), MoveDealStage { stage: PipelineStage::ClosedWon })
            .await
            .unwrap();
        assert_eq!(won.probability, 100);
        assert!(won.closed_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_promotion_leaves_deal_open() {
        let ws = Uuid::new_v4();
        let customer = customer(ws);
        let deal = Deal::create(ws, new_deal(customer.id, PipelineStage::Negotiation), Uuid::new_v4());
        let deal_id = deal.id;

        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_id().returning(move |_| Ok(Some(customer.clone())));
        let mut deals = MockDealRepository::new();
        deals.expect_find_by_id().returning(move |_| Ok(Some(deal.clone())));
        deals.expect_update().never();
        deals
            .expect_update_won()
            .times(1)
            .returning(|_| Err(DomainError::DatabaseError("connection reset".into())));
        let service = CrmService::new(Arc::new(customers), Arc::new(deals), access(Some(WorkspaceRole::Member)));

        let result = service
            .move_stage(ws, deal_id, Uuid::new_v4(), MoveDealStage { stage: PipelineStage::ClosedWon })
            .await;
        assert!(matches!(result, Err(DomainError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_missing_customer_blocks_win_before_any_write() {
        let ws = Uuid::new_v4();
        let deal = Deal::create(ws, new_deal(Uuid::new_v4(), PipelineStage::Proposal), Uuid::new_v4());
        let deal_id = deal.id;

        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_id().returning(|_| Ok(None));
        let mut deals = MockDealRepository::new();
        deals.expect_find_by_id().returning(move |_| Ok(Some(deal.clone())));
        deals.expect_update().never();
        deals.expect_update_won().never();
        let service = CrmService::new(Arc::new(customers), Arc::new(deals), access(Some(WorkspaceRole::Member)));

        let result = service
            .move_stage(ws, deal_id, Uuid::new_v4(), MoveDealStage { stage: PipelineStage::ClosedWon })
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_stage_move_skips_promotion() {
        let ws = Uuid::new_v4();
        let deal = Deal::create(ws, new_deal(Uuid::new_v4(), PipelineStage::Lead), Uuid::new_v4());
        let deal_id = deal.id;

        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_id().never();
        let mut deals = MockDealRepository::new();
        deals.expect_find_by_id().returning(move |_| Ok(Some(deal.clone())));
        deals.expect_update_won().never();
        deals.expect_update().times(1).returning(|d| Ok(d.clone()));
        let service = CrmService::new(Arc::new(customers), Arc::new(deals), access(Some(WorkspaceRole::Member)));

        let moved = service
            .move_stage(ws, deal_id, Uuid::new_v4(), MoveDealStage { stage: PipelineStage::Qualified })
            .await
            .unwrap();
        assert_eq!(moved.stage, PipelineStage::Qualified);
    }

    #[tokio::test]
    async fn test_pipeline_summary_lists_every_stage() {
        let mut deals = MockDealRepository::new();
        deals.expect_pipeline_summary().returning(|_| {
            Ok(vec![StageSummary { stage: PipelineStage::Proposal, count: 2, total_amount_cents: 90_000 }])
        });
        let service = CrmService::new(
            Arc::new(MockCustomerRepository::new()),
            Arc::new(deals),
            access(Some(WorkspaceRole::Member)),
        );

        let summary = service.pipeline_summary(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
        assert_eq!(summary.len(), PipelineStage::ALL.len());
        let proposal = summary.iter().find(|s| s.stage == PipelineStage::Proposal).unwrap();
        assert_eq!(proposal.count, 2);
    }

    #[tokio::test]
    async fn test_non_members_are_refused() {
        let service = CrmService::new(
            Arc::new(MockCustomerRepository::new()),
            Arc::new(MockDealRepository::new()),
            access(None),
        );
        let result = service
            .list_customers(Uuid::new_v4(), Uuid::new_v4(), CustomerFilter::default(), Pagination::default())
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }
}
