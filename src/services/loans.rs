//! Loan management service

use crate::{
    error::AppResult,
    models::{
        loan::{Checkout, CreateLoanRequest, LoanAction, LoanPatchRequest, LoanRecord},
        user::Identity,
    },
    repository::Repository,
};

/// Number of loans returned by the listing
pub const LOAN_LIST_LIMIT: i64 = 120;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<LoanRecord>> {
        self.repository.loans.list_recent(LOAN_LIST_LIMIT).await
    }

    /// Record a new loan, taking one copy out of stock
    pub async fn checkout(&self, actor: &Identity, request: CreateLoanRequest) -> AppResult<i32> {
        let checkout = Checkout::try_from(request)?;
        let id = self.repository.loans.checkout(actor.id, &checkout).await?;

        tracing::info!(
            loan_id = id,
            book_id = checkout.book_id,
            user_id = checkout.user_id,
            "Loan recorded"
        );
        Ok(id)
    }

    /// Return or extend a loan
    pub async fn apply(&self, actor: &Identity, id: i32, request: LoanPatchRequest) -> AppResult<LoanAction> {
        let action = LoanAction::try_from(request)?;
        match action {
            LoanAction::Return => {
                self.repository.loans.mark_returned(actor.id, id).await?;
                tracing::info!(loan_id = id, "Loan returned");
            }
            LoanAction::Extend(due_on) => {
                self.repository.loans.extend(actor.id, id, due_on).await?;
                tracing::info!(loan_id = id, %due_on, "Loan extended");
            }
        }
        Ok(action)
    }

    pub async fn delete(&self, actor: &Identity, id: i32) -> AppResult<()> {
        self.repository.loans.delete(actor.id, id).await?;
        tracing::info!(loan_id = id, "Loan deleted");
        Ok(())
    }
}
