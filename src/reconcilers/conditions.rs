//! Condition history bookkeeping for NetworkFilesystem status

use crate::crd::{ConditionType, NetworkFSCondition};

/// Record `cond` in the history, keyed by condition type.
///
/// An existing entry of the same type is replaced in place, so the history
/// holds at most one record per type. Unless `refresh` is set, an entry that
/// already says the same thing (status, reason, message) keeps its original
/// transition time. Callers set `refresh` when the observed state moved.
///
/// Returns true if the history changed.
pub fn update_conditions(
    conds: &mut Vec<NetworkFSCondition>,
    cond: NetworkFSCondition,
    refresh: bool,
) -> bool {
    match conds.iter_mut().find(|c| c.type_ == cond.type_) {
        Some(existing) => {
            if !refresh
                && existing.status == cond.status
                && existing.reason == cond.reason
                && existing.message == cond.message
            {
                return false;
            }
            *existing = cond;
            true
        }
        None => {
            conds.push(cond);
            true
        }
    }
}

/// Find the condition of the given type
#[cfg(test)]
pub(crate) fn find_condition(
    conds: &[NetworkFSCondition],
    type_: ConditionType,
) -> Option<&NetworkFSCondition> {
    conds.iter().find(|c| c.type_ == type_)
}
