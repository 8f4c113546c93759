use std::time::Duration;
use stereo_sync_core::{
    CameraInfo, Header, Image, ManualClock, StereoSynchronizer, Synchronizer, Time,
};

/// Wall time the test clock starts at.
#[allow(dead_code)]
pub const START: Duration = Duration::from_secs(1_500_000_000);

/// Create an image whose stamp and payload identify it.
#[allow(dead_code)]
pub fn create_image(frame_id: &str, stamp_ms: u64, len: usize, fill: u8) -> Image {
    let stamp = Time::from_duration(Duration::from_millis(stamp_ms));
    Image::new(
        Header::new(0, stamp, frame_id),
        len as u32,
        1,
        "mono8",
        1,
        vec![fill; len],
    )
}

/// Create camera info with `num_coeffs` distortion coefficients.
#[allow(dead_code)]
pub fn create_info(frame_id: &str, stamp_ms: u64, num_coeffs: usize) -> CameraInfo {
    let stamp = Time::from_duration(Duration::from_millis(stamp_ms));
    CameraInfo::new(Header::new(0, stamp, frame_id), 640, 480)
        .with_distortion("plumb_bob", vec![0.01; num_coeffs])
}

/// Create a stereo synchronizer driven by a manual clock.
#[allow(dead_code)]
pub fn create_stereo_sync() -> (StereoSynchronizer<ManualClock>, ManualClock) {
    let clock = ManualClock::new(START);
    let sync = Synchronizer::stereo_with_clock(clock.clone());
    (sync, clock)
}

/// Assert that every frame and metadata carry the same stamp and sequence.
#[allow(dead_code)]
pub fn assert_stamped_alike<'a>(
    pairs: impl IntoIterator<Item = &'a (Image, CameraInfo)>,
    stamp: Time,
    seq: u32,
) {
    for (image, info) in pairs {
        assert_eq!(image.header.stamp, stamp, "image stamp");
        assert_eq!(info.header.stamp, stamp, "camera info stamp");
        assert_eq!(image.header.seq, seq, "image seq");
        assert_eq!(info.header.seq, seq, "camera info seq");
    }
}
