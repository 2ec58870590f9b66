//! Section Status Store - per-section lifecycle state for the editing surface.
//!
//! A keyed map from [`SectionId`] to status plus an optional error message,
//! an edit scratch copy, and a collapse flag. The store enforces no
//! transition table; the orchestrator and the editing surface are the only
//! writers and each follows its documented discipline. Scratch copies are
//! section-scoped so concurrent pipeline updates to sibling sections never
//! clobber an in-progress edit.

use dashmap::DashMap;

use crate::domain::value_objects::{SectionId, SectionStatus};

/// State held per section id.
#[derive(Debug, Clone, Default)]
pub struct SectionState {
    pub status: Option<SectionStatus>,
    pub error: Option<String>,
    /// Scratch copy of the draft sub-object while the section is being
    /// edited; discarded on cancel, handed back on commit.
    pub scratch: Option<serde_json::Value>,
    /// Presentation-only collapse flag, tracked independently of status.
    pub collapsed: bool,
}

/// Session-scoped store of section lifecycle state.
///
/// Injected into the orchestrator at construction so multiple drafts and
/// tests run in isolation; never a module-level global.
#[derive(Debug, Default)]
pub struct SectionStatusStore {
    sections: DashMap<SectionId, SectionState>,
}

impl SectionStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status for a section. Last write wins; clears any
    /// previous error message.
    pub fn set_status(&self, id: SectionId, status: SectionStatus) {
        let mut entry = self.sections.entry(id).or_default();
        entry.status = Some(status);
        entry.error = None;
    }

    /// Mark a section errored with a message. Last write wins.
    pub fn set_error(&self, id: SectionId, message: impl Into<String>) {
        let mut entry = self.sections.entry(id).or_default();
        entry.status = Some(SectionStatus::Error);
        entry.error = Some(message.into());
    }

    pub fn status(&self, id: SectionId) -> Option<SectionStatus> {
        self.sections.get(&id).and_then(|s| s.status)
    }

    pub fn error(&self, id: SectionId) -> Option<String> {
        self.sections.get(&id).and_then(|s| s.error.clone())
    }

    /// Enter edit mode, stashing a scratch copy of the section's draft
    /// sub-object. Returns false (and changes nothing) unless the section is
    /// currently ready: generating and errored sections cannot be edited,
    /// and a section already in edit keeps its existing scratch.
    pub fn start_edit(&self, id: SectionId, scratch: serde_json::Value) -> bool {
        let mut entry = self.sections.entry(id).or_default();
        if entry.status != Some(SectionStatus::Ready) {
            return false;
        }
        entry.status = Some(SectionStatus::Editing);
        entry.scratch = Some(scratch);
        true
    }

    /// Leave edit mode, discarding the scratch copy.
    pub fn cancel_edit(&self, id: SectionId) {
        if let Some(mut entry) = self.sections.get_mut(&id) {
            if entry.status == Some(SectionStatus::Editing) {
                entry.status = Some(SectionStatus::Ready);
                entry.scratch = None;
            }
        }
    }

    /// Leave edit mode, handing the scratch copy back to the caller for
    /// merging into the draft. Returns None if the section was not editing.
    pub fn commit_edit(&self, id: SectionId) -> Option<serde_json::Value> {
        let mut entry = self.sections.get_mut(&id)?;
        if entry.status != Some(SectionStatus::Editing) {
            return None;
        }
        entry.status = Some(SectionStatus::Ready);
        entry.scratch.take()
    }

    /// Replace the scratch copy while the section stays in edit mode.
    /// Returns false when the section is not editing.
    pub fn update_scratch(&self, id: SectionId, scratch: serde_json::Value) -> bool {
        match self.sections.get_mut(&id) {
            Some(mut entry) if entry.status == Some(SectionStatus::Editing) => {
                entry.scratch = Some(scratch);
                true
            }
            _ => false,
        }
    }

    /// Read the scratch copy without leaving edit mode (for live preview).
    pub fn scratch(&self, id: SectionId) -> Option<serde_json::Value> {
        self.sections.get(&id).and_then(|s| s.scratch.clone())
    }

    /// Lock a ready section against edits.
    pub fn lock(&self, id: SectionId) {
        if let Some(mut entry) = self.sections.get_mut(&id) {
            if entry.status == Some(SectionStatus::Ready) {
                entry.status = Some(SectionStatus::Locked);
            }
        }
    }

    /// Unlock back to ready.
    pub fn unlock(&self, id: SectionId) {
        if let Some(mut entry) = self.sections.get_mut(&id) {
            if entry.status == Some(SectionStatus::Locked) {
                entry.status = Some(SectionStatus::Ready);
            }
        }
    }

    pub fn set_collapsed(&self, id: SectionId, collapsed: bool) {
        self.sections.entry(id).or_default().collapsed = collapsed;
    }

    pub fn is_collapsed(&self, id: SectionId) -> bool {
        self.sections.get(&id).map(|s| s.collapsed).unwrap_or(false)
    }

    /// Wipe every entry. Used when a generation run fails so the workspace
    /// shows nothing rather than a stale partial state.
    pub fn clear(&self) {
        self.sections.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Snapshot of all statuses for the editing surface.
    pub fn statuses(&self) -> Vec<(SectionId, SectionStatus)> {
        self.sections
            .iter()
            .filter_map(|entry| entry.status.map(|s| (*entry.key(), s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_status_last_write_wins() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::BasicInfo, SectionStatus::Generating);
        store.set_status(SectionId::BasicInfo, SectionStatus::Ready);
        assert_eq!(store.status(SectionId::BasicInfo), Some(SectionStatus::Ready));
    }

    #[test]
    fn test_set_status_clears_error() {
        let store = SectionStatusStore::new();
        store.set_error(SectionId::Spot(1), "backend hiccup");
        assert_eq!(store.status(SectionId::Spot(1)), Some(SectionStatus::Error));

        store.set_status(SectionId::Spot(1), SectionStatus::Generating);
        assert_eq!(store.error(SectionId::Spot(1)), None);
    }

    #[test]
    fn test_edit_cycle_commit() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::Spot(0), SectionStatus::Ready);

        assert!(store.start_edit(SectionId::Spot(0), json!({"name": "Old Mill"})));
        assert_eq!(store.status(SectionId::Spot(0)), Some(SectionStatus::Editing));

        let scratch = store.commit_edit(SectionId::Spot(0)).expect("scratch");
        assert_eq!(scratch["name"], "Old Mill");
        assert_eq!(store.status(SectionId::Spot(0)), Some(SectionStatus::Ready));
        assert!(store.scratch(SectionId::Spot(0)).is_none());
    }

    #[test]
    fn test_update_scratch_only_while_editing() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::Spot(0), SectionStatus::Ready);
        assert!(!store.update_scratch(SectionId::Spot(0), json!({"name": "x"})));

        store.start_edit(SectionId::Spot(0), json!({"name": "a"}));
        assert!(store.update_scratch(SectionId::Spot(0), json!({"name": "b"})));
        assert_eq!(store.commit_edit(SectionId::Spot(0)).expect("scratch")["name"], "b");
    }

    #[test]
    fn test_edit_cycle_cancel_discards_scratch() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::Story, SectionStatus::Ready);
        store.start_edit(SectionId::Story, json!({"prologue": "It was raining."}));

        store.cancel_edit(SectionId::Story);
        assert_eq!(store.status(SectionId::Story), Some(SectionStatus::Ready));
        assert!(store.scratch(SectionId::Story).is_none());
    }

    #[test]
    fn test_start_edit_requires_ready() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::Spot(2), SectionStatus::Generating);
        assert!(!store.start_edit(SectionId::Spot(2), json!({})));
        assert_eq!(store.status(SectionId::Spot(2)), Some(SectionStatus::Generating));
    }

    #[test]
    fn test_editing_one_section_does_not_block_siblings() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::Spot(0), SectionStatus::Ready);
        store.set_status(SectionId::Spot(1), SectionStatus::Ready);

        assert!(store.start_edit(SectionId::Spot(0), json!({"name": "a"})));
        assert!(store.start_edit(SectionId::Spot(1), json!({"name": "b"})));

        // A pipeline update to a sibling leaves the scratch untouched.
        store.set_status(SectionId::Spot(2), SectionStatus::Generating);
        assert_eq!(store.scratch(SectionId::Spot(0)).expect("scratch")["name"], "a");
    }

    #[test]
    fn test_lock_unlock() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::BasicInfo, SectionStatus::Ready);
        store.lock(SectionId::BasicInfo);
        assert_eq!(store.status(SectionId::BasicInfo), Some(SectionStatus::Locked));
        assert!(!store.start_edit(SectionId::BasicInfo, json!({})));
        store.unlock(SectionId::BasicInfo);
        assert_eq!(store.status(SectionId::BasicInfo), Some(SectionStatus::Ready));
    }

    #[test]
    fn test_collapse_is_independent_of_status() {
        let store = SectionStatusStore::new();
        store.set_collapsed(SectionId::Spot(3), true);
        assert!(store.is_collapsed(SectionId::Spot(3)));
        assert_eq!(store.status(SectionId::Spot(3)), None);
    }

    #[test]
    fn test_clear_wipes_everything() {
        let store = SectionStatusStore::new();
        store.set_status(SectionId::BasicInfo, SectionStatus::Ready);
        store.set_status(SectionId::Spot(0), SectionStatus::Generating);
        store.clear();
        assert!(store.is_empty());
        assert!(store.statuses().is_empty());
    }
}
