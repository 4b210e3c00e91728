//! Turning raw swap legs into logical swaps.
//!
//! Both legs of a swap share a secret hash. The account sees its own leg and,
//! once the counterparty has answered, the counterpart leg on the other
//! system. The state of the logical swap follows from the pair of remote
//! states.

use tokend_types::{secret_matches_hash, RemoteSwapState, SwapRecord, SwapResource, SwapState};
use tracing::warn;

use crate::SwapError;

/// Raw leg tagged with the index of the system it was fetched from
#[derive(Debug, Clone, PartialEq)]
pub struct SwapLeg {
    pub resource: SwapResource,
    pub system_index: usize,
}

impl SwapLeg {
    pub fn new(resource: SwapResource, system_index: usize) -> Self {
        Self {
            resource,
            system_index,
        }
    }
}

/// Which side of the swap the account is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    Source,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification<'a> {
    pub state: SwapState,
    pub perspective: Perspective,
    pub own: &'a SwapLeg,
    pub counterpart: Option<&'a SwapLeg>,
}

/// Group legs by secret hash.
///
/// Groups keep the order in which their hash first appeared; legs inside a
/// group are sorted by creation time.
pub fn group_by_hash(legs: Vec<SwapLeg>) -> Vec<Vec<SwapLeg>> {
    let mut groups: Vec<Vec<SwapLeg>> = Vec::new();

    for leg in legs {
        let existing = groups
            .iter_mut()
            .find(|group| group[0].resource.secret_hash == leg.resource.secret_hash);
        match existing {
            Some(group) => group.push(leg),
            None => groups.push(vec![leg]),
        }
    }

    for group in &mut groups {
        group.sort_by_key(|leg| leg.resource.created_at);
    }
    groups
}

/// State of one group of legs as seen by `account_id`
pub fn classify<'a>(account_id: &str, group: &'a [SwapLeg]) -> Result<Classification<'a>, SwapError> {
    let Some(own) = group.first() else {
        return Err(SwapError::inconsistent("", "empty swap group"));
    };
    let hash = own.resource.secret_hash.as_str();

    let perspective = if own.resource.source.id == account_id {
        Perspective::Source
    } else {
        Perspective::Destination
    };

    let counterpart = group.iter().skip(1).find(|leg| match perspective {
        Perspective::Source => leg.resource.source.id == own.resource.destination.id,
        Perspective::Destination => leg.resource.destination.id == own.resource.source.id,
    });

    let classified = |state| Classification {
        state,
        perspective,
        own,
        counterpart,
    };

    if own.resource.state == RemoteSwapState::Canceled {
        return Ok(classified(SwapState::Canceled));
    }

    match group.len() {
        1 => return Ok(classified(SwapState::Created)),
        2 => {}
        n => return Err(SwapError::inconsistent(hash, format!("{n} legs share the hash"))),
    }

    let Some(counterpart_leg) = counterpart else {
        return Err(SwapError::inconsistent(hash, "no counterpart leg"));
    };

    let state = match (perspective, counterpart_leg.resource.state, own.resource.state) {
        (_, RemoteSwapState::Open, _) => SwapState::WaitingForCloseBySource,
        (Perspective::Source, RemoteSwapState::Closed, _) => SwapState::Completed,
        (Perspective::Source, RemoteSwapState::Canceled, _) => SwapState::CanceledByCounterparty,
        (Perspective::Destination, RemoteSwapState::Closed, RemoteSwapState::Open) => {
            SwapState::CanBeReceivedByDest
        }
        (Perspective::Destination, RemoteSwapState::Closed, RemoteSwapState::Closed) => {
            SwapState::Completed
        }
        (Perspective::Destination, counterpart_state, own_state) => {
            return Err(SwapError::inconsistent(
                hash,
                format!("counterpart {counterpart_state:?} with own leg {own_state:?}"),
            ))
        }
    };

    Ok(classified(state))
}

/// Secret of a classified swap: revealed on the counterpart leg, or stored
/// locally when this device created the swap
pub fn resolve_secret(
    classification: &Classification<'_>,
    stored_secret: impl FnOnce(&str) -> Option<Vec<u8>>,
) -> Option<Vec<u8>> {
    let hash = classification.own.resource.secret_hash.as_str();

    let revealed = classification
        .counterpart
        .and_then(|leg| leg.resource.secret.as_deref())
        .and_then(|secret| match hex::decode(secret) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(secret_hash = hash, error = %e, "revealed swap secret is not hex");
                None
            }
        });

    let secret = revealed.or_else(|| stored_secret(hash))?;
    if secret_matches_hash(&secret, hash) {
        Some(secret)
    } else {
        warn!(secret_hash = hash, "discarding swap secret that does not match its hash");
        None
    }
}

/// Logical swap record for one group of legs
pub fn build_record(
    account_id: &str,
    group: &[SwapLeg],
    stored_secret: impl FnOnce(&str) -> Option<Vec<u8>>,
) -> Result<SwapRecord, SwapError> {
    let classification = classify(account_id, group)?;
    let secret = resolve_secret(&classification, stored_secret);

    Ok(SwapRecord::from_resource(
        &classification.own.resource,
        secret,
        classification.state,
        classification.perspective == Perspective::Destination,
        classification.own.system_index,
        classification.counterpart.map(|leg| leg.resource.id.clone()),
    )?)
}
