//! stereo-sync-node - republishes camera streams with shared timestamps.
//!
//! This crate drives the [stereo-sync-core](../stereo_sync_core/index.html)
//! synchronizer from a rate-limited loop. Every configured stream has an
//! input topic carrying images with their camera info and an output topic
//! that receives the re-stamped copies.
//!
//! # Configuration
//!
//! The node reads a YAML file specifying:
//! - The streams to synchronize, each with a name, an input and an output topic
//! - The maximum loop rate
//! - The subscription queue depth
//! - How often statistics are logged
//!
//! Every field has a default. An empty file yields the classic stereo
//! setup: `unsynced/{left,right}/image_raw` republished on
//! `synced/{left,right}/image_raw` at no more than 120 Hz.
//!
//! # Transport
//!
//! The node talks to the outside world through the [`Transport`] trait.
//! [`ChannelBus`] is an in-process implementation built on `flume`
//! channels.

pub mod config;
pub mod node;
pub mod transport;

pub use config::{Config, RateConfig, StreamConfig};
pub use node::{StreamSynchronizer, SyncNode};
pub use transport::{CameraMessage, CameraPublisher, ChannelBus, ChannelPublisher, Transport};

// Re-export stereo-sync-core for convenience
pub use stereo_sync_core;
