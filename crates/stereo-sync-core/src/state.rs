use crate::{
    clock::{Clock, SystemClock},
    message::{CameraInfo, Image},
    slot::{Slot, SlotMessage},
    types::{Key, Side},
};
use eyre::{Result, ensure};
use indexmap::IndexMap;
use tracing::debug;

/// The stamped frame and metadata of every slot, in slot order.
pub type Emission<K, F, M> = IndexMap<K, (F, M)>;

/// A synchronizer for a left and a right camera.
pub type StereoSynchronizer<C = SystemClock> = Synchronizer<Side, Image, CameraInfo, C>;

/// Pairs up the latest frame of every input stream.
///
/// Each key owns one [Slot]. [ingest](Synchronizer::ingest) overwrites
/// the slot and marks it ready. Once every slot is ready,
/// [emit](Synchronizer::emit) stamps all frames and metadata with one
/// clock reading and one sequence number, returns them, and clears the
/// ready flags.
///
/// All mutating operations take `&mut self`. Callers sharing a
/// synchronizer between threads must hold a lock across the readiness
/// check and the emission, or use [try_emit](Synchronizer::try_emit)
/// under the lock.
#[derive(Debug)]
pub struct Synchronizer<K, F, M, C = SystemClock>
where
    K: Key,
{
    /// Slots indexed by key, in registration order.
    slots: IndexMap<K, Slot<F, M>>,

    /// The sequence number written into the next emission.
    sequence: u32,

    /// Number of emissions so far.
    emitted: u64,

    /// The source of emission stamps.
    clock: C,
}

impl<K, F, M, C> Synchronizer<K, F, M, C>
where
    K: Key,
    F: SlotMessage,
    M: SlotMessage,
    C: Clock,
{
    /// Create a synchronizer with one empty slot per key.
    ///
    /// The key list must be non-empty and free of duplicates.
    pub fn new<I>(keys: I, clock: C) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        let num_keys = keys.len();

        let slots: IndexMap<_, _> = keys.into_iter().map(|key| (key, Slot::new())).collect();
        ensure!(!slots.is_empty(), "at least one slot is required");
        ensure!(slots.len() == num_keys, "slot keys must be distinct");

        Ok(Self::from_slots(slots, clock))
    }

    fn from_slots(slots: IndexMap<K, Slot<F, M>>, clock: C) -> Self {
        Self {
            slots,
            sequence: 0,
            emitted: 0,
            clock,
        }
    }

    /// Store the latest frame and metadata of the stream identified by
    /// the key and mark its slot ready.
    ///
    /// Any value stored earlier and not yet emitted is replaced. Returns
    /// the values back if the key was not registered.
    pub fn ingest(&mut self, key: K, frame: F, metadata: M) -> Result<(), (F, M)> {
        let Some((index, _key, slot)) = self.slots.get_full_mut(&key) else {
            return Err((frame, metadata));
        };

        let resize = slot.store(frame, metadata);

        if let Some((from, to)) = resize.frame {
            debug!(slot = index, from, to, "Resizing output image");
        }
        if let Some((from, to)) = resize.metadata {
            debug!(slot = index, from, to, "Resizing camera info");
        }

        Ok(())
    }

    /// Checks if every slot received a frame since the last emission.
    pub fn is_ready(&self) -> bool {
        self.slots.values().all(|slot| slot.is_ready())
    }

    /// Checks if the slot received a frame since the last emission.
    /// Unknown keys are never ready.
    pub fn is_slot_ready(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|slot| slot.is_ready())
    }

    /// Stamp every slot with the current time and sequence number and
    /// return their contents.
    ///
    /// The caller is expected to check [is_ready](Self::is_ready) first.
    /// Without that check, slots that did not receive a new frame are
    /// stamped and returned again with their previous contents.
    pub fn emit(&mut self) -> Emission<K, F, M> {
        let stamp = self.clock.now();
        let seq = self.sequence;

        let emission: Emission<K, F, M> = self
            .slots
            .iter_mut()
            .map(|(key, slot)| {
                slot.stamp(stamp, seq);
                (key.clone(), slot.take())
            })
            .collect();

        self.sequence = self.sequence.wrapping_add(1);
        self.emitted += 1;

        debug!(seq, stamp = %stamp, num_slots = emission.len(), "Emitting synchronized frames");

        emission
    }

    /// Emit if and only if every slot is ready.
    pub fn try_emit(&mut self) -> Option<Emission<K, F, M>> {
        self.is_ready().then(|| self.emit())
    }
}

impl<K, F, M, C> Synchronizer<K, F, M, C>
where
    K: Key,
{
    /// The sequence number the next emission will carry.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }

    pub fn slot(&self, key: &K) -> Option<&Slot<F, M>> {
        self.slots.get(key)
    }
}

impl<K, F, M, C> Synchronizer<K, F, M, C>
where
    K: Key,
    F: SlotMessage,
    M: SlotMessage,
{
    /// Get synchronization statistics.
    pub fn stats(&self) -> SyncStats<K> {
        SyncStats {
            emitted: self.emitted,
            next_sequence: self.sequence,
            slots: self
                .slots
                .iter()
                .map(|(key, slot)| {
                    let stats = SlotStats {
                        received: slot.received(),
                        ready: slot.is_ready(),
                    };
                    (key.clone(), stats)
                })
                .collect(),
        }
    }
}

impl<F, M> Synchronizer<Side, F, M, SystemClock>
where
    F: SlotMessage,
    M: SlotMessage,
{
    /// Create a left/right synchronizer stamped by the wall clock.
    pub fn stereo() -> Self {
        Self::stereo_with_clock(SystemClock)
    }
}

impl<F, M, C> Synchronizer<Side, F, M, C>
where
    F: SlotMessage,
    M: SlotMessage,
    C: Clock,
{
    /// Create a left/right synchronizer stamped by the given clock.
    pub fn stereo_with_clock(clock: C) -> Self {
        let slots = Side::ALL.into_iter().map(|side| (side, Slot::new())).collect();
        Self::from_slots(slots, clock)
    }

    pub fn new_image_left(&self) -> bool {
        self.is_slot_ready(&Side::Left)
    }

    pub fn new_image_right(&self) -> bool {
        self.is_slot_ready(&Side::Right)
    }

    pub fn both_ready(&self) -> bool {
        self.new_image_left() && self.new_image_right()
    }
}

/// Statistics about the synchronization state.
#[derive(Debug, Clone)]
pub struct SyncStats<K>
where
    K: Key,
{
    /// Number of emissions so far.
    pub emitted: u64,

    /// The sequence number of the next emission.
    pub next_sequence: u32,

    /// Per-slot counters in slot order.
    pub slots: IndexMap<K, SlotStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStats {
    /// Frames stored into the slot so far.
    pub received: u64,

    /// Whether the slot holds a frame that was not emitted yet.
    pub ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, types::Time};
    use std::time::Duration;

    fn frame(fill: u8) -> Image {
        Image {
            data: vec![fill; 4],
            ..Default::default()
        }
    }

    fn create_test_sync() -> (StereoSynchronizer<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Duration::from_secs(1000));
        let sync = Synchronizer::stereo_with_clock(clock.clone());
        (sync, clock)
    }

    #[test]
    fn test_new_rejects_empty_keys() {
        let result: Result<Synchronizer<&str, Image, CameraInfo, _>> =
            Synchronizer::new(Vec::new(), ManualClock::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_duplicate_keys() {
        let result: Result<Synchronizer<&str, Image, CameraInfo, _>> =
            Synchronizer::new(["A", "B", "A"], ManualClock::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_new_keeps_key_order() {
        let sync: Synchronizer<&str, Image, CameraInfo, _> =
            Synchronizer::new(["C", "A", "B"], ManualClock::default()).unwrap();
        let keys: Vec<_> = sync.keys().copied().collect();
        assert_eq!(keys, ["C", "A", "B"]);
        assert_eq!(sync.len(), 3);
    }

    #[test]
    fn test_stereo_starts_unarmed() {
        let (sync, _clock) = create_test_sync();
        assert!(!sync.new_image_left());
        assert!(!sync.new_image_right());
        assert!(!sync.both_ready());
        assert_eq!(sync.sequence(), 0);
    }

    #[test]
    fn test_ingest_unknown_key_is_returned() {
        let mut sync: Synchronizer<&str, Image, CameraInfo, _> =
            Synchronizer::new(["A", "B"], ManualClock::default()).unwrap();

        let result = sync.ingest("C", frame(1), CameraInfo::default());

        let (returned, _info) = result.unwrap_err();
        assert_eq!(returned.data, vec![1; 4]);
        assert!(!sync.is_slot_ready(&"C"));
        assert!(!sync.is_slot_ready(&"A"));
    }

    #[test]
    fn test_try_emit_requires_all_slots() {
        let (mut sync, _clock) = create_test_sync();

        sync.ingest(Side::Left, frame(1), CameraInfo::default()).unwrap();
        assert!(sync.try_emit().is_none());
        assert_eq!(sync.sequence(), 0);
        assert!(sync.new_image_left());

        sync.ingest(Side::Right, frame(2), CameraInfo::default()).unwrap();
        let emission = sync.try_emit().unwrap();
        assert_eq!(emission.len(), 2);
        assert_eq!(sync.sequence(), 1);
    }

    #[test]
    fn test_emit_reads_clock_at_emission() {
        let (mut sync, clock) = create_test_sync();

        sync.ingest(Side::Left, frame(1), CameraInfo::default()).unwrap();
        clock.advance(Duration::from_millis(5));
        sync.ingest(Side::Right, frame(2), CameraInfo::default()).unwrap();
        clock.advance(Duration::from_millis(5));

        let emission = sync.emit();
        let expected = Time::new(1000, 10_000_000);
        for (image, info) in emission.values() {
            assert_eq!(image.header.stamp, expected);
            assert_eq!(info.header.stamp, expected);
        }
    }

    #[test]
    fn test_unguarded_emit_republishes_stale_frames() {
        let (mut sync, _clock) = create_test_sync();

        sync.ingest(Side::Left, frame(1), CameraInfo::default()).unwrap();
        sync.ingest(Side::Right, frame(2), CameraInfo::default()).unwrap();
        sync.emit();

        let emission = sync.emit();
        assert_eq!(emission[&Side::Left].0.data, vec![1; 4]);
        assert_eq!(emission[&Side::Left].0.header.seq, 1);
        assert_eq!(emission[&Side::Right].1.header.seq, 1);
    }

    #[test]
    fn test_unguarded_emit_on_empty_slots_uses_defaults() {
        let (mut sync, _clock) = create_test_sync();

        let emission = sync.emit();

        assert!(emission[&Side::Left].0.data.is_empty());
        assert_eq!(emission[&Side::Right].0.header.stamp, Time::new(1000, 0));
        assert_eq!(sync.sequence(), 1);
    }

    #[test]
    fn test_sequence_wraps() {
        let (mut sync, _clock) = create_test_sync();
        sync.sequence = u32::MAX;

        let emission = sync.emit();

        assert_eq!(emission[&Side::Left].0.header.seq, u32::MAX);
        assert_eq!(sync.sequence(), 0);
    }

    #[test]
    fn test_stats_counts_frames_and_emissions() {
        let (mut sync, _clock) = create_test_sync();

        sync.ingest(Side::Left, frame(1), CameraInfo::default()).unwrap();
        sync.ingest(Side::Left, frame(2), CameraInfo::default()).unwrap();
        sync.ingest(Side::Right, frame(3), CameraInfo::default()).unwrap();
        sync.try_emit().unwrap();
        sync.ingest(Side::Right, frame(4), CameraInfo::default()).unwrap();

        let stats = sync.stats();
        assert_eq!(stats.emitted, 1);
        assert_eq!(stats.next_sequence, 1);
        assert_eq!(
            stats.slots[&Side::Left],
            SlotStats {
                received: 2,
                ready: false
            }
        );
        assert_eq!(
            stats.slots[&Side::Right],
            SlotStats {
                received: 2,
                ready: true
            }
        );
    }
}
