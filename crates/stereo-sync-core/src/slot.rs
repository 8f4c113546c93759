use crate::{
    message::PayloadLen,
    types::{Stamped, Time},
};

/// Requirements on the frame and metadata types held by a [Slot].
pub trait SlotMessage: Stamped + PayloadLen + Clone + Default + Send {}

impl<T> SlotMessage for T where T: Stamped + PayloadLen + Clone + Default + Send {}

/// Storage for the latest frame and metadata of one input stream.
///
/// A slot holds exactly one frame and one metadata value. A new arrival
/// replaces whatever is stored, consumed or not.
#[derive(Debug, Clone, Default)]
pub struct Slot<F, M> {
    frame: F,
    metadata: M,
    ready: bool,
    received: u64,
}

/// Reports which parts of a slot changed length on [Slot::store].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resize {
    pub frame: Option<(usize, usize)>,
    pub metadata: Option<(usize, usize)>,
}

impl<F, M> Slot<F, M>
where
    F: SlotMessage,
    M: SlotMessage,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &F {
        &self.frame
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// True iff a frame arrived since the slot was last emitted.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of frames stored into this slot so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Replace the stored frame and metadata and mark the slot ready.
    pub(crate) fn store(&mut self, frame: F, metadata: M) -> Resize {
        let resize = Resize {
            frame: length_change(self.frame.payload_len(), frame.payload_len()),
            metadata: length_change(self.metadata.payload_len(), metadata.payload_len()),
        };

        self.frame = frame;
        self.metadata = metadata;
        self.ready = true;
        self.received += 1;

        resize
    }

    /// Write the same stamp and sequence number into the frame and the
    /// metadata.
    pub(crate) fn stamp(&mut self, stamp: Time, seq: u32) {
        self.frame.restamp(stamp, seq);
        self.metadata.restamp(stamp, seq);
    }

    /// Copy out the stored values and clear the ready flag.
    ///
    /// The values stay in the slot so that an unguarded emission can
    /// publish them again.
    pub(crate) fn take(&mut self) -> (F, M) {
        self.ready = false;
        (self.frame.clone(), self.metadata.clone())
    }
}

fn length_change(old: usize, new: usize) -> Option<(usize, usize)> {
    (old != new).then_some((old, new))
}
