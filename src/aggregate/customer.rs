//! Customer Aggregate
//!
//! The Customer aggregate root guards names, email, number, birth date,
//! status and the owned address collection. Every operation returns a
//! `Result`; expected failures are values, never panics.

use chrono::{Months, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    AuditState, CustomerEvent, CustomerNumber, CustomerStatus, DomainError, EmailAddress,
};

use super::{Address, AddressDetails, AddressId, AggregateRoot, CustomerId};

/// Maximum length of first and last name
const MAX_NAME_LENGTH: usize = 128;

/// Oldest accepted age in years
const MAX_AGE_YEARS: u32 = 150;

/// Stored state used to rebuild a Customer (no validation, no events)
#[derive(Debug, Clone)]
pub struct CustomerSnapshot {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub number: CustomerNumber,
    pub date_of_birth: Option<NaiveDate>,
    pub status: CustomerStatus,
    pub addresses: Vec<Address>,
    pub concurrency_version: Uuid,
    pub audit: AuditState,
}

/// Customer Aggregate
#[derive(Debug, Clone)]
pub struct Customer {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: EmailAddress,
    number: CustomerNumber,
    date_of_birth: Option<NaiveDate>,
    status: CustomerStatus,
    addresses: Vec<Address>,
    concurrency_version: Uuid,
    audit: AuditState,
    events: Vec<CustomerEvent>,
}

impl Customer {
    // =========================================================================
    // Customer::create()
    // =========================================================================

    /// Create a new customer and register the creation event.
    ///
    /// All rules are checked; the error carries every failed message.
    pub fn create(
        first_name: &str,
        last_name: &str,
        email: &str,
        number: CustomerNumber,
    ) -> Result<Self, DomainError> {
        let mut messages = Vec::new();

        let first_name = check_name("First name", first_name)
            .map_err(|m| messages.push(m))
            .ok();
        let last_name = check_name("Last name", last_name)
            .map_err(|m| messages.push(m))
            .ok();
        let email = EmailAddress::create(email)
            .map_err(|e| messages.push(e.to_string()))
            .ok();

        let (Some(first_name), Some(last_name), Some(email)) = (first_name, last_name, email)
        else {
            return Err(DomainError::Validation(messages));
        };

        let mut customer = Self {
            id: CustomerId::new(),
            first_name,
            last_name,
            email,
            number,
            date_of_birth: None,
            status: CustomerStatus::Lead,
            addresses: Vec::new(),
            concurrency_version: Uuid::new_v4(),
            audit: AuditState::default(),
            events: Vec::new(),
        };

        customer.register_event(CustomerEvent::CustomerCreated {
            event_id: Uuid::new_v4(),
            customer_id: customer.id.as_uuid(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.to_string(),
            number: customer.number.to_string(),
            occurred_at: Utc::now(),
        });

        Ok(customer)
    }

    /// Rebuild a customer from stored state
    pub fn restore(snapshot: CustomerSnapshot) -> Self {
        Self {
            id: snapshot.id,
            first_name: snapshot.first_name,
            last_name: snapshot.last_name,
            email: snapshot.email,
            number: snapshot.number,
            date_of_birth: snapshot.date_of_birth,
            status: snapshot.status,
            addresses: snapshot.addresses,
            concurrency_version: snapshot.concurrency_version,
            audit: snapshot.audit,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Change methods
    // =========================================================================

    /// Change first and last name.
    ///
    /// Both blank is a no-op. One blank fails. Unchanged values succeed
    /// without registering an event.
    pub fn change_name(&mut self, first_name: &str, last_name: &str) -> Result<&mut Self, DomainError> {
        if first_name.trim().is_empty() && last_name.trim().is_empty() {
            return Ok(self);
        }

        let mut messages = Vec::new();
        let first = check_name("First name", first_name).map_err(|m| messages.push(m)).ok();
        let last = check_name("Last name", last_name).map_err(|m| messages.push(m)).ok();
        let (Some(first), Some(last)) = (first, last) else {
            return Err(DomainError::Validation(messages));
        };

        if first == self.first_name && last == self.last_name {
            return Ok(self);
        }

        self.first_name = first;
        self.last_name = last;
        self.register_updated();
        Ok(self)
    }

    /// Change the email address (re-validated and normalized)
    pub fn change_email(&mut self, email: &str) -> Result<&mut Self, DomainError> {
        let email = EmailAddress::create(email)?;
        if email == self.email {
            return Ok(self);
        }

        self.email = email;
        self.register_updated();
        Ok(self)
    }

    /// Change the date of birth, checked against today's date (UTC)
    pub fn change_birth_date(&mut self, date: Option<NaiveDate>) -> Result<&mut Self, DomainError> {
        self.change_birth_date_as_of(date, Utc::now().date_naive())
    }

    /// Change the date of birth, checked against the given `today`.
    ///
    /// Fails if the date lies after `today` or more than 150 years before it.
    pub fn change_birth_date_as_of(
        &mut self,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<&mut Self, DomainError> {
        if let Some(date) = date {
            Self::check_birth_date(date, today)?;
        }

        if date == self.date_of_birth {
            return Ok(self);
        }

        self.date_of_birth = date;
        self.register_updated();
        Ok(self)
    }

    /// Check a date of birth against `today` without changing anything
    pub fn check_birth_date(date: NaiveDate, today: NaiveDate) -> Result<(), DomainError> {
        if date > today {
            return Err(DomainError::validation("Date of birth cannot be in the future"));
        }

        let oldest = today.checked_sub_months(Months::new(MAX_AGE_YEARS * 12));
        if oldest.is_some_and(|oldest| date < oldest) {
            return Err(DomainError::validation(format!(
                "Date of birth implies an age over {MAX_AGE_YEARS} years"
            )));
        }

        Ok(())
    }

    /// Change the status; `None` leaves it untouched
    pub fn change_status(&mut self, status: Option<CustomerStatus>) -> Result<&mut Self, DomainError> {
        let Some(status) = status else {
            return Ok(self);
        };

        if status == self.status {
            return Ok(self);
        }

        self.status = status;
        self.register_updated();
        Ok(self)
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Add an address; a primary address demotes all others
    pub fn add_address(&mut self, details: AddressDetails) -> Result<AddressId, DomainError> {
        let address = Address::create(details)?;
        let id = address.id();
        let is_primary = address.is_primary();

        self.addresses.push(address);
        if is_primary {
            self.demote_others(id);
        }

        self.register_updated();
        Ok(id)
    }

    /// Change an existing address
    pub fn change_address(
        &mut self,
        id: AddressId,
        details: AddressDetails,
    ) -> Result<&mut Self, DomainError> {
        let address = self
            .addresses
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(DomainError::AddressNotFound(id.as_uuid()))?;

        let changed = address.change(details)?;
        let is_primary = address.is_primary();

        let demoted = is_primary && self.demote_others(id);
        if changed || demoted {
            self.register_updated();
        }
        Ok(self)
    }

    /// Remove an address
    pub fn remove_address(&mut self, id: AddressId) -> Result<&mut Self, DomainError> {
        let position = self
            .addresses
            .iter()
            .position(|a| a.id() == id)
            .ok_or(DomainError::AddressNotFound(id.as_uuid()))?;

        self.addresses.remove(position);
        self.register_updated();
        Ok(self)
    }

    /// Make the given address the only primary one
    pub fn set_primary_address(&mut self, id: AddressId) -> Result<&mut Self, DomainError> {
        let address = self
            .addresses
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(DomainError::AddressNotFound(id.as_uuid()))?;

        let promoted = !address.is_primary();
        address.set_primary(true);

        let demoted = self.demote_others(id);
        if promoted || demoted {
            self.register_updated();
        }
        Ok(self)
    }

    /// Clear the primary flag on every address except `keep`.
    /// Returns `true` if any flag was cleared.
    fn demote_others(&mut self, keep: AddressId) -> bool {
        let mut demoted = false;
        for address in self.addresses.iter_mut().filter(|a| a.id() != keep) {
            if address.is_primary() {
                address.set_primary(false);
                demoted = true;
            }
        }
        demoted
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Mark the customer for deletion; the repository removes it
    pub fn delete(&mut self) {
        self.register_event(CustomerEvent::CustomerDeleted {
            event_id: Uuid::new_v4(),
            customer_id: self.id.as_uuid(),
            email: self.email.to_string(),
            occurred_at: Utc::now(),
        });
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn register_updated(&mut self) {
        self.register_event(CustomerEvent::CustomerUpdated {
            event_id: Uuid::new_v4(),
            customer_id: self.id.as_uuid(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.to_string(),
            status: self.status,
            occurred_at: Utc::now(),
        });
    }

    /// A pending update event is replaced in place so at most one exists
    fn register_event(&mut self, event: CustomerEvent) {
        if event.is_update() {
            if let Some(existing) = self.events.iter_mut().find(|e| e.is_update()) {
                *existing = event;
                return;
            }
        }
        self.events.push(event);
    }

    // =========================================================================
    // Persistence hooks
    // =========================================================================

    pub(crate) fn set_concurrency_version(&mut self, version: Uuid) {
        self.concurrency_version = version;
    }

    pub(crate) fn audit_mut(&mut self) -> &mut AuditState {
        &mut self.audit
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn number(&self) -> &CustomerNumber {
        &self.number
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn status(&self) -> CustomerStatus {
        self.status
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn primary_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_primary())
    }

    pub fn audit(&self) -> &AuditState {
        &self.audit
    }
}

impl AggregateRoot for Customer {
    type Event = CustomerEvent;

    fn aggregate_type() -> &'static str {
        "Customer"
    }

    fn aggregate_id(&self) -> Uuid {
        self.id.as_uuid()
    }

    fn concurrency_version(&self) -> Uuid {
        self.concurrency_version
    }

    fn domain_events(&self) -> &[CustomerEvent] {
        &self.events
    }

    fn take_domain_events(&mut self) -> Vec<CustomerEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Trimmed, non-empty and bounded name
fn check_name(label: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{label} is required"));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("{label} must not exceed {MAX_NAME_LENGTH} characters"));
    }
    Ok(value.to_string())
}

// =========================================================================
// Customer unit tests
// =========================================================================
