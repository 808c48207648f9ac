//! Service registry: the arena of service records.
//!
//! Services are keyed by a monotonically assigned [`ServiceId`]. Records are
//! only replaced through [`ServiceRegistry::commit`], which refuses any
//! engagement change the lifecycle does not allow.

use std::collections::BTreeMap;

use chrono::Utc;
use gigledger_types::{
    AccountId, ContentHash, Engagement, GigError, LedgerConfig, Result, Service, ServiceId,
    constants,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-supplied fields of a new service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    pub title: String,
    pub start_location: String,
    pub end_location: String,
    /// Content address of the already-uploaded requester photo.
    pub image_hash: ContentHash,
}

impl NewService {
    /// Check text fields and amount against the ledger limits.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero, negative, or below the minimum
    /// - `InvalidInput` for an empty title or over-long text
    pub fn validate(&self, amount: Decimal, config: &LedgerConfig) -> Result<()> {
        if amount <= Decimal::ZERO || amount < config.min_amount {
            return Err(GigError::InvalidAmount {
                amount,
                minimum: config.min_amount,
            });
        }
        if self.title.trim().is_empty() {
            return Err(GigError::InvalidInput {
                reason: "title must not be empty".into(),
            });
        }
        check_len("title", &self.title, config.max_title_len)?;
        check_len(
            "start_location",
            &self.start_location,
            config.max_location_len,
        )?;
        check_len("end_location", &self.end_location, config.max_location_len)?;
        Ok(())
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(GigError::InvalidInput {
            reason: format!("{field} is {len} characters, limit is {max}"),
        });
    }
    Ok(())
}

/// Holds every service ever created, in creation order.
pub struct ServiceRegistry {
    services: BTreeMap<ServiceId, Service>,
    next_id: ServiceId,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: BTreeMap::new(),
            next_id: ServiceId(constants::FIRST_SERVICE_ID),
        }
    }

    /// The ID the next `create` will assign.
    #[must_use]
    pub fn next_id(&self) -> ServiceId {
        self.next_id
    }

    /// Store a new `Open` service under the next ID. Never fails: all
    /// validation happens before the caller gets here.
    pub fn create(
        &mut self,
        requester: AccountId,
        new: NewService,
        amount: Decimal,
    ) -> ServiceId {
        let id = self.next_id;
        let now = Utc::now();
        self.services.insert(
            id,
            Service {
                id,
                requester,
                title: new.title,
                start_location: new.start_location,
                end_location: new.end_location,
                image_hash: new.image_hash,
                amount,
                engagement: Engagement::Open,
                created_at: now,
                updated_at: now,
            },
        );
        self.next_id = id.next();
        id
    }

    /// Look up a service.
    ///
    /// # Errors
    /// Returns `ServiceNotFound` for an unknown ID.
    pub fn get(&self, id: ServiceId) -> Result<&Service> {
        self.services.get(&id).ok_or(GigError::ServiceNotFound(id))
    }

    /// Replace a service's engagement with the result of a transition.
    ///
    /// # Errors
    /// - `ServiceNotFound` for an unknown ID
    /// - `WrongState` if the lifecycle does not allow the move
    pub fn commit(&mut self, id: ServiceId, engagement: Engagement) -> Result<()> {
        let service = self
            .services
            .get_mut(&id)
            .ok_or(GigError::ServiceNotFound(id))?;
        let from = service.status();
        if !from.can_transition_to(engagement.status()) {
            return Err(GigError::WrongState {
                operation: "commit",
                actual: from,
            });
        }
        service.engagement = engagement;
        service.updated_at = Utc::now();
        Ok(())
    }

    /// All IDs in creation order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<ServiceId> {
        self.services.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// Services posted by `account`, in creation order.
    #[must_use]
    pub fn by_requester(&self, account: AccountId) -> Vec<&Service> {
        self.iter().filter(|s| s.requester == account).collect()
    }

    /// Services `account` was approved to fulfil, in creation order.
    #[must_use]
    pub fn by_provider(&self, account: AccountId) -> Vec<&Service> {
        self.iter()
            .filter(|s| s.accepted_by() == Some(account))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigledger_types::{ReceiptTokenId, ServiceStatus};

    fn listing() -> NewService {
        NewService {
            title: "Move a sofa".into(),
            start_location: "12 Elm Street".into(),
            end_location: "48 Oak Avenue".into(),
            image_hash: ContentHash::of(b"sofa.jpg"),
        }
    }

    #[test]
    fn ids_are_monotonic_from_one() {
        let mut reg = ServiceRegistry::new();
        let a = AccountId::random();
        let first = reg.create(a, listing(), Decimal::ONE);
        let second = reg.create(a, listing(), Decimal::ONE);
        assert_eq!(first, ServiceId(1));
        assert_eq!(second, ServiceId(2));
        assert_eq!(reg.next_id(), ServiceId(3));
        assert_eq!(reg.all_ids(), vec![ServiceId(1), ServiceId(2)]);
    }

    #[test]
    fn created_service_is_open() {
        let mut reg = ServiceRegistry::new();
        let a = AccountId::random();
        let id = reg.create(a, listing(), Decimal::new(15, 1));
        let svc = reg.get(id).unwrap();
        assert_eq!(svc.requester, a);
        assert_eq!(svc.amount, Decimal::new(15, 1));
        assert_eq!(svc.status(), ServiceStatus::Open);
    }

    #[test]
    fn unknown_id_not_found() {
        let reg = ServiceRegistry::new();
        assert!(matches!(
            reg.get(ServiceId(7)).unwrap_err(),
            GigError::ServiceNotFound(ServiceId(7))
        ));
    }

    #[test]
    fn commit_rejects_illegal_jump() {
        let mut reg = ServiceRegistry::new();
        let id = reg.create(AccountId::random(), listing(), Decimal::ONE);
        let err = reg
            .commit(
                id,
                Engagement::Accepted {
                    provider: AccountId::random(),
                    token_id: ReceiptTokenId(1),
                },
            )
            .unwrap_err();
        assert!(matches!(err, GigError::WrongState { .. }));
        assert_eq!(reg.get(id).unwrap().status(), ServiceStatus::Open);
    }

    #[test]
    fn filters_by_party() {
        let mut reg = ServiceRegistry::new();
        let a = AccountId::random();
        let b = AccountId::random();
        let first = reg.create(a, listing(), Decimal::ONE);
        reg.create(b, listing(), Decimal::ONE);
        reg.commit(first, Engagement::PendingApproval { acceptor: b })
            .unwrap();
        reg.commit(
            first,
            Engagement::Accepted {
                provider: b,
                token_id: ReceiptTokenId(1),
            },
        )
        .unwrap();

        assert_eq!(reg.by_requester(a).len(), 1);
        assert_eq!(reg.by_requester(b).len(), 1);
        assert_eq!(reg.by_provider(b)[0].id, first);
        assert!(reg.by_provider(a).is_empty());
    }

    #[test]
    fn validate_rejects_zero_and_negative_amounts() {
        let cfg = LedgerConfig::default();
        for amount in [Decimal::ZERO, Decimal::NEGATIVE_ONE] {
            let err = listing().validate(amount, &cfg).unwrap_err();
            assert!(matches!(err, GigError::InvalidAmount { .. }));
        }
        listing().validate(Decimal::ONE, &cfg).unwrap();
    }

    #[test]
    fn validate_rejects_bad_text() {
        let cfg = LedgerConfig {
            max_title_len: 5,
            ..LedgerConfig::default()
        };
        let mut new = listing();
        new.title = "   ".into();
        assert!(matches!(
            new.validate(Decimal::ONE, &cfg).unwrap_err(),
            GigError::InvalidInput { .. }
        ));
        new.title = "far too long".into();
        assert!(matches!(
            new.validate(Decimal::ONE, &cfg).unwrap_err(),
            GigError::InvalidInput { .. }
        ));
    }
}
