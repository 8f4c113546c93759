use std::{fmt, hash::Hash, time::Duration};

/// The key that identifies a slot in the synchronizer.
pub trait Key: Clone + PartialEq + Eq + Hash + Sync + Send {}

impl<K> Key for K where K: Clone + PartialEq + Eq + Hash + Sync + Send {}

/// Gives the synchronizer access to the header of a message so that it
/// can be re-stamped on emission.
pub trait Stamped {
    fn header(&self) -> &Header;

    fn header_mut(&mut self) -> &mut Header;

    /// Overwrite the stamp and sequence number of the header.
    fn restamp(&mut self, stamp: Time, seq: u32) {
        let header = self.header_mut();
        header.stamp = stamp;
        header.seq = seq;
    }
}

/// A point in time carried by message headers.
///
/// Mirrors the `(sec, nanosec)` layout used by camera drivers:
/// - `sec`: seconds since epoch, negative for pre-1970 times
/// - `nanosec`: nanoseconds component, 0-999999999
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl Time {
    pub const ZERO: Time = Time { sec: 0, nanosec: 0 };

    pub fn new(sec: i32, nanosec: u32) -> Self {
        Self { sec, nanosec }
    }

    /// Convert a duration since the UNIX epoch to a time stamp.
    ///
    /// Seconds saturate at `i32::MAX`.
    ///
    /// ```
    /// use stereo_sync_core::Time;
    /// use std::time::Duration;
    ///
    /// let time = Time::from_duration(Duration::new(1000, 500_000_000));
    /// assert_eq!(time, Time::new(1000, 500_000_000));
    /// ```
    pub fn from_duration(duration: Duration) -> Self {
        let sec = i32::try_from(duration.as_secs()).unwrap_or(i32::MAX);
        Self {
            sec,
            nanosec: duration.subsec_nanos(),
        }
    }

    /// Convert the stamp to a duration since the UNIX epoch.
    ///
    /// Negative timestamps floor to zero.
    ///
    /// ```
    /// use stereo_sync_core::Time;
    /// use std::time::Duration;
    ///
    /// assert_eq!(Time::new(1000, 0).as_duration(), Duration::from_secs(1000));
    /// assert_eq!(Time::new(-1, 0).as_duration(), Duration::ZERO);
    /// ```
    pub fn as_duration(&self) -> Duration {
        if self.sec >= 0 {
            Duration::new(self.sec as u64, self.nanosec)
        } else {
            Duration::ZERO
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nanosec)
    }
}

/// The stamp carried by both frames and their metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Sequence number, assigned by the synchronizer on emission.
    pub seq: u32,
    /// Acquisition time, overwritten by the synchronizer on emission.
    pub stamp: Time,
    /// Coordinate frame the data is associated with.
    pub frame_id: String,
}

impl Header {
    pub fn new(seq: u32, stamp: Time, frame_id: impl Into<String>) -> Self {
        Self {
            seq,
            stamp,
            frame_id: frame_id.into(),
        }
    }
}

/// Identifies the camera of a stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in slot order.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
