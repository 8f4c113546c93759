//! Runs the sync node on an in-process bus fed by two synthetic cameras.
//!
//! Usage: cargo run --example loopback -- [config.yaml]

use eyre::{Result, WrapErr};
use std::time::Duration;
use stereo_sync_node::{
    CameraMessage, ChannelBus, Config, SyncNode, Transport,
    stereo_sync_core::{CameraInfo, Clock, Header, Image, SystemClock, Time},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Publish a synthetic frame on `topic` every `period`, stamped with a
/// clock that runs `offset` behind the wall clock.
async fn camera(
    bus: ChannelBus,
    topic: String,
    frame_id: String,
    period: Duration,
    offset: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    let mut counter = 0u8;

    loop {
        ticker.tick().await;

        let now = SystemClock.now().as_duration().saturating_sub(offset);
        let header = Header::new(0, Time::from_duration(now), frame_id.clone());
        let image = Image::new(header.clone(), 64, 48, "mono8", 1, vec![counter; 64 * 48]);
        let info = CameraInfo::new(header, 64, 48).with_distortion("plumb_bob", vec![0.0; 5]);

        if bus.send(&topic, CameraMessage::new(image, info)).is_err() {
            break;
        }
        counter = counter.wrapping_add(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(config_file = %path, "Loading configuration");
            Config::load(&path)?
        }
        None => Config::default(),
    };

    let bus = ChannelBus::new();
    let node = SyncNode::new(&bus, config.clone(), SystemClock)
        .wrap_err("Failed to create sync node")?;

    // Cameras with unrelated rates and clock offsets.
    for (i, stream) in config.streams.iter().enumerate() {
        let period = Duration::from_millis(33 + 7 * i as u64);
        let offset = Duration::from_millis(120 * i as u64);
        tokio::spawn(camera(
            bus.clone(),
            stream.input.clone(),
            format!("camera_{}", stream.name),
            period,
            offset,
        ));
    }

    // Print what comes out of the first output topic.
    let first = &config.streams[0];
    let output = bus.subscribe(&first.output, 8)?;
    let name = first.name.clone();
    tokio::spawn(async move {
        while let Ok(msg) = output.recv_async().await {
            info!(
                stream = %name,
                seq = msg.image.header.seq,
                stamp = %msg.image.header.stamp,
                "Received synchronized frame"
            );
        }
    });

    let stats = node
        .run_until(async {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(Duration::from_secs(3)) => {}
            }
        })
        .await;

    info!(emitted = stats.emitted, "Done");
    Ok(())
}
