//! Access decisions for every operation the service exposes.
//!
//! | Operation | Rule |
//! |---|---|
//! | `ListEvents`, `RegisterAccount`, `Login`, `RefreshToken` | anyone |
//! | `ViewEvent`, `CreateEvent`, `RegisterForEvent`, `ListOwnRegistrations` | authenticated |
//! | `UpdateEvent`, `DeleteEvent` | authenticated; organizer only when ownership is enforced |

use crate::error::AuthError;
use eventhub_core::UserId;
use serde::Serialize;
use std::fmt;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// Caller's user id
    pub user_id: UserId,
    /// Caller's login handle
    pub username: String,
}

/// An operation subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Browse or search the catalog
    ListEvents,
    /// Create an account
    RegisterAccount,
    /// Exchange credentials for tokens
    Login,
    /// Exchange a refresh token for an access token
    RefreshToken,
    /// Read one event
    ViewEvent,
    /// Create an event
    CreateEvent,
    /// Register the caller for an event
    RegisterForEvent,
    /// List the caller's registrations
    ListOwnRegistrations,
    /// Replace an event. `organizer` is `None` until the event has been loaded.
    UpdateEvent {
        /// Organizer of the target event, when known
        organizer: Option<UserId>,
    },
    /// Delete an event. `organizer` is `None` until the event has been loaded.
    DeleteEvent {
        /// Organizer of the target event, when known
        organizer: Option<UserId>,
    },
}

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No principal was presented
    Unauthenticated,
    /// Caller is not the event's organizer
    NotOrganizer,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::NotOrganizer => write!(f, "only the organizer may modify this event"),
        }
    }
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed
    Allow,
    /// Refuse
    Deny {
        /// Reason for the refusal
        reason: DenyReason,
    },
}

impl Decision {
    /// Convert into a result. Anonymous refusals become `NotAuthenticated`,
    /// the rest `PermissionDenied`.
    ///
    /// # Errors
    ///
    /// Returns the matching [`AuthError`] for `Deny`.
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny {
                reason: DenyReason::Unauthenticated,
            } => Err(AuthError::NotAuthenticated),
            Self::Deny { reason } => Err(AuthError::PermissionDenied(reason.to_string())),
        }
    }
}

/// Policy switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Restrict update and delete to the event's organizer. Off by default.
    pub enforce_event_ownership: bool,
}

/// Decide whether `principal` may perform `operation`.
///
/// # Examples
///
/// ```
/// use eventhub_auth::policy::{authorize, AccessPolicy, Decision, DenyReason, Operation};
///
/// let policy = AccessPolicy::default();
/// assert_eq!(authorize(None, Operation::ListEvents, policy), Decision::Allow);
/// assert_eq!(
///     authorize(None, Operation::CreateEvent, policy),
///     Decision::Deny { reason: DenyReason::Unauthenticated },
/// );
/// ```
#[must_use]
pub fn authorize(
    principal: Option<&Principal>,
    operation: Operation,
    policy: AccessPolicy,
) -> Decision {
    let deny = |reason| Decision::Deny { reason };

    match operation {
        Operation::ListEvents
        | Operation::RegisterAccount
        | Operation::Login
        | Operation::RefreshToken => Decision::Allow,

        Operation::ViewEvent
        | Operation::CreateEvent
        | Operation::RegisterForEvent
        | Operation::ListOwnRegistrations => match principal {
            Some(_) => Decision::Allow,
            None => deny(DenyReason::Unauthenticated),
        },

        Operation::UpdateEvent { organizer } | Operation::DeleteEvent { organizer } => {
            let Some(principal) = principal else {
                return deny(DenyReason::Unauthenticated);
            };
            match organizer {
                Some(organizer)
                    if policy.enforce_event_ownership && organizer != principal.user_id =>
                {
                    deny(DenyReason::NotOrganizer)
                }
                _ => Decision::Allow,
            }
        }
    }
}
