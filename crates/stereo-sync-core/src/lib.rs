//! This library pairs up the latest frame of two (or more) independently
//! timestamped camera streams and makes them look time-aligned.
//!
//! Every stream owns a slot that keeps only its most recent frame and
//! metadata. When every slot received something new, an emission stamps
//! all of them with one clock reading and one shared sequence number.
//! There is no matching by original timestamps: the latest frame on each
//! side wins.
//!
//! # Usage
//!
//! ```rust
//! use stereo_sync_core::{
//!     CameraInfo, Header, Image, ManualClock, Side, StereoSynchronizer, Synchronizer, Time,
//! };
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(Duration::from_secs(1000));
//! let mut sync: StereoSynchronizer<ManualClock> = Synchronizer::stereo_with_clock(clock.clone());
//!
//! // Frames arrive with unrelated stamps.
//! let left = Image {
//!     header: Header::new(17, Time::new(999, 120), "camera_left"),
//!     data: vec![1; 16],
//!     ..Default::default()
//! };
//! let right = Image {
//!     header: Header::new(4, Time::new(998, 770), "camera_right"),
//!     data: vec![2; 16],
//!     ..Default::default()
//! };
//!
//! sync.ingest(Side::Left, left, CameraInfo::default()).unwrap();
//! assert!(!sync.both_ready());
//! sync.ingest(Side::Right, right, CameraInfo::default()).unwrap();
//! assert!(sync.both_ready());
//!
//! let pair = sync.emit();
//! let (left, left_info) = &pair[&Side::Left];
//! let (right, _) = &pair[&Side::Right];
//! assert_eq!(left.header.stamp, Time::new(1000, 0));
//! assert_eq!(left.header.stamp, right.header.stamp);
//! assert_eq!(left_info.header.stamp, left.header.stamp);
//! assert_eq!(left.header.seq, 0);
//! assert!(!sync.both_ready());
//! ```

pub mod clock;
pub mod message;
pub mod slot;
pub mod state;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use message::{CameraInfo, Image, PayloadLen, RegionOfInterest};
pub use slot::{Slot, SlotMessage};
pub use state::{Emission, SlotStats, StereoSynchronizer, SyncStats, Synchronizer};
pub use types::*;
