//! In-memory InvoiceRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{injected_failure, lock};
use crate::domain::entitlement::Invoice;
use crate::domain::foundation::{DomainError, PaymentIntentId};
use crate::ports::{InvoiceRepository, SaveResult};

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: Mutex<HashMap<PaymentIntentId, Invoice>>,
    failing: AtomicBool,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        lock(&self.invoices).len()
    }

    /// Make every insert fail until switched off.
    pub fn fail_inserts(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn insert(&self, invoice: &Invoice) -> Result<SaveResult, DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure("invoices"));
        }

        let mut invoices = lock(&self.invoices);
        if invoices.contains_key(&invoice.payment_intent_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        invoices.insert(invoice.payment_intent_id, invoice.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<Option<Invoice>, DomainError> {
        Ok(lock(&self.invoices).get(payment_intent_id).cloned())
    }
}
