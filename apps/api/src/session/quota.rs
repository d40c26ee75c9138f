//! Per-session analysis quota.
//!
//! A unit is consumed as soon as an analysis starts, whatever happens next.

use crate::session::Session;

/// Consumes one unit if the session is under `max_quota`.
/// Returns false, leaving the counter untouched, once the limit is reached.
pub fn check_and_increment(session: &mut Session, max_quota: u32) -> bool {
    if session.usage_count >= max_quota {
        return false;
    }
    session.usage_count += 1;
    true
}

pub fn remaining(session: &Session, max_quota: u32) -> u32 {
    max_quota.saturating_sub(session.usage_count)
}
