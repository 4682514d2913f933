use crate::catalog::Entry;

/// Decides which catalog entries are sent for translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntrySelector {
    /// Leave entries that are already translated (non-fuzzy, no empty slot).
    pub skip_translated: bool,
}

impl EntrySelector {
    pub fn new(skip_translated: bool) -> Self {
        Self { skip_translated }
    }

    pub fn should_translate(&self, entry: &Entry) -> bool {
        if entry.msgid().trim().is_empty() {
            return false;
        }
        !(self.skip_translated && entry.is_translated())
    }
}
