use std::time::Duration;
use stereo_sync_node::{
    CameraMessage, ChannelBus, ChannelPublisher, Config, SyncNode,
    stereo_sync_core::{CameraInfo, Header, Image, ManualClock, Time},
};

/// Wall time the test clock starts at.
#[allow(dead_code)]
pub const START: Duration = Duration::from_secs(1_600_000_000);

/// Create a camera message whose stamp and payload identify it.
#[allow(dead_code)]
pub fn camera_message(frame_id: &str, stamp_ms: u64, len: usize, fill: u8) -> CameraMessage {
    let header = Header::new(0, Time::from_duration(Duration::from_millis(stamp_ms)), frame_id);
    let image = Image::new(header.clone(), len as u32, 1, "mono8", 1, vec![fill; len]);
    let info = CameraInfo::new(header, len as u32, 1).with_distortion("plumb_bob", vec![0.0; 5]);
    CameraMessage::new(image, info)
}

/// Create a node with the default stereo configuration on a fresh bus.
#[allow(dead_code)]
pub fn create_stereo_node() -> (SyncNode<ChannelPublisher, ManualClock>, ChannelBus, ManualClock) {
    create_node(Config::default())
}

#[allow(dead_code)]
pub fn create_node(config: Config) -> (SyncNode<ChannelPublisher, ManualClock>, ChannelBus, ManualClock) {
    let bus = ChannelBus::new();
    let clock = ManualClock::new(START);
    let node = SyncNode::new(&bus, config, clock.clone()).unwrap();
    (node, bus, clock)
}

/// Input and output topics of the default configuration.
#[allow(dead_code)]
pub mod topics {
    pub const LEFT_IN: &str = "unsynced/left/image_raw";
    pub const RIGHT_IN: &str = "unsynced/right/image_raw";
    pub const LEFT_OUT: &str = "synced/left/image_raw";
    pub const RIGHT_OUT: &str = "synced/right/image_raw";
}
