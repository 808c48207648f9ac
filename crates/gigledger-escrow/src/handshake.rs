//! Approval handshake: two-step acceptance of a service.
//!
//! A provider first *requests* to fulfil a service; only the requester can
//! then *approve* them. Nobody can accept a service unilaterally.
//!
//! Every function here is pure: it reads the current record and the caller
//! and returns either the next [`Engagement`] or a rejection. The ledger
//! commits the result; these functions never mutate anything.

use gigledger_types::{AccountId, Engagement, GigError, ReceiptTokenId, Result, Service};

/// `Open → PendingApproval { acceptor: caller }`.
///
/// # Errors
/// - `SelfDealing` if the caller is the requester
/// - `WrongState` unless the service is `Open`
pub fn request_acceptance(service: &Service, caller: AccountId) -> Result<Engagement> {
    if caller == service.requester {
        return Err(GigError::SelfDealing);
    }
    match service.engagement {
        Engagement::Open => Ok(Engagement::PendingApproval { acceptor: caller }),
        _ => Err(wrong_state("request_acceptance", service)),
    }
}

/// `PendingApproval → Accepted { provider: acceptor, token_id }`.
///
/// `token_id` is the receipt token the ledger is about to mint.
///
/// # Errors
/// - `WrongState` unless the service is `PendingApproval`
/// - `Unauthorized` unless the caller is the requester
pub fn approve_acceptance(
    service: &Service,
    caller: AccountId,
    token_id: ReceiptTokenId,
) -> Result<Engagement> {
    let acceptor = pending_acceptor(service, "approve_acceptance")?;
    require_requester(service, caller, "approve_acceptance")?;
    Ok(Engagement::Accepted {
        provider: acceptor,
        token_id,
    })
}

/// `PendingApproval → Open`, by the requester.
///
/// # Errors
/// - `WrongState` unless the service is `PendingApproval`
/// - `Unauthorized` unless the caller is the requester
pub fn reject_acceptance(service: &Service, caller: AccountId) -> Result<(Engagement, AccountId)> {
    let acceptor = pending_acceptor(service, "reject_acceptance")?;
    require_requester(service, caller, "reject_acceptance")?;
    Ok((Engagement::Open, acceptor))
}

/// `PendingApproval → Open`, by the pending acceptor themselves.
///
/// # Errors
/// - `WrongState` unless the service is `PendingApproval`
/// - `Unauthorized` unless the caller is the pending acceptor
pub fn withdraw_acceptance(service: &Service, caller: AccountId) -> Result<Engagement> {
    let acceptor = pending_acceptor(service, "withdraw_acceptance")?;
    if caller != acceptor {
        return Err(GigError::Unauthorized {
            operation: "withdraw_acceptance",
            caller,
        });
    }
    Ok(Engagement::Open)
}

fn pending_acceptor(service: &Service, operation: &'static str) -> Result<AccountId> {
    service
        .pending_acceptor()
        .ok_or_else(|| wrong_state(operation, service))
}

pub(crate) fn require_requester(
    service: &Service,
    caller: AccountId,
    operation: &'static str,
) -> Result<()> {
    if caller != service.requester {
        return Err(GigError::Unauthorized { operation, caller });
    }
    Ok(())
}

pub(crate) fn wrong_state(operation: &'static str, service: &Service) -> GigError {
    GigError::WrongState {
        operation,
        actual: service.status(),
    }
}
