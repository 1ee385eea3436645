//! Per-kind track lookup for one recording.

use crate::track::TrackKind;
use crate::writer::TrackId;

/// Maps each enabled [`TrackKind`] to the writer track that receives it.
///
/// Built once when the writer is prepared. A kind without an entry is
/// disabled for the session and its samples are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TrackTable {
    slots: [Option<TrackId>; 3],
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(kind: TrackKind) -> usize {
        match kind {
            TrackKind::Video => 0,
            TrackKind::MicAudio => 1,
            TrackKind::AppAudio => 2,
        }
    }

    /// Registers `track` for `kind`, replacing any previous entry.
    pub fn insert(&mut self, kind: TrackKind, track: TrackId) {
        self.slots[Self::slot(kind)] = Some(track);
    }

    /// Returns the track for `kind`, if enabled.
    pub fn get(&self, kind: TrackKind) -> Option<TrackId> {
        self.slots[Self::slot(kind)]
    }

    /// Enabled kinds with their tracks, in [`TrackKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackKind, TrackId)> + '_ {
        TrackKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|track| (kind, track)))
    }

    /// Number of enabled tracks.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table() {
        let table = TrackTable::new();
        assert_eq!(table.len(), 0);
        assert_eq!(table.get(TrackKind::Video), None);
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = TrackTable::new();
        table.insert(TrackKind::Video, TrackId::new(0));
        table.insert(TrackKind::AppAudio, TrackId::new(1));

        assert_eq!(table.get(TrackKind::Video), Some(TrackId::new(0)));
        assert_eq!(table.get(TrackKind::AppAudio), Some(TrackId::new(1)));
        assert_eq!(table.get(TrackKind::MicAudio), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_iter_follows_kind_order() {
        let mut table = TrackTable::new();
        table.insert(TrackKind::AppAudio, TrackId::new(0));
        table.insert(TrackKind::Video, TrackId::new(1));

        let kinds: Vec<_> = table.iter().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec![TrackKind::Video, TrackKind::AppAudio]);
    }
}
