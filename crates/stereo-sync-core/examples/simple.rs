use eyre::{Result, eyre};
use stereo_sync_core::{CameraInfo, Header, Image, Side, StereoSynchronizer, Time};
use tracing_subscriber::EnvFilter;

fn camera_frame(side: Side, stamp: Time, fill: u8) -> (Image, CameraInfo) {
    let header = Header::new(0, stamp, format!("camera_{side}"));
    let image = Image::new(header.clone(), 4, 2, "mono8", 1, vec![fill; 8]);
    let info = CameraInfo::new(header, 4, 2).with_distortion("plumb_bob", vec![0.0; 5]);
    (image, info)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let mut sync = StereoSynchronizer::stereo();

    // Left runs faster than right; only the latest left frame gets paired.
    let arrivals = [
        (Side::Left, Time::new(100, 0), 1),
        (Side::Left, Time::new(100, 33_000_000), 2),
        (Side::Right, Time::new(99, 980_000_000), 3),
        (Side::Left, Time::new(100, 66_000_000), 4),
        (Side::Right, Time::new(100, 47_000_000), 5),
    ];

    for (side, stamp, fill) in arrivals {
        let (image, info) = camera_frame(side, stamp, fill);
        sync.ingest(side, image, info)
            .map_err(|_| eyre!("No slot for the {side} camera"))?;

        if let Some(pair) = sync.try_emit() {
            for (side, (image, info)) in &pair {
                println!(
                    "{side}: seq={} stamp={} info_stamp={} payload={:?}",
                    image.header.seq, image.header.stamp, info.header.stamp, image.data
                );
            }
        }
    }

    Ok(())
}
