//! SyncNode implementation.

use crate::{
    config::Config,
    transport::{CameraMessage, CameraPublisher, Transport},
};
use eyre::Result;
use flume::{Receiver, TryRecvError};
use std::{future::Future, time::Duration};
use stereo_sync_core::{
    CameraInfo, Clock, Emission, Image, SyncStats, Synchronizer, SystemClock,
};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// The synchronizer keyed by stream name.
pub type StreamSynchronizer<C> = Synchronizer<String, Image, CameraInfo, C>;

/// Wiring of one configured stream.
struct Stream<P> {
    name: String,
    input_topic: String,
    output_topic: String,
    rx: Receiver<CameraMessage>,
    publisher: P,
    connected: bool,
}

/// The stream synchronization node.
///
/// The node receives camera messages from every input topic, keeps the
/// latest one per stream, and once every stream delivered something new
/// republishes all of them with a shared timestamp and sequence number
/// on the output topics.
///
/// Message delivery and emission both happen on the task that drives the
/// node, so the readiness check and the stamp never race with an
/// incoming frame.
pub struct SyncNode<P, C = SystemClock>
where
    P: CameraPublisher,
{
    /// Streams in slot order.
    streams: Vec<Stream<P>>,

    /// Pairing state.
    sync: StreamSynchronizer<C>,

    /// Minimum time between two loop iterations.
    period: Duration,

    /// Configuration (for logging and the stats interval).
    config: Config,
}

impl<P, C> SyncNode<P, C>
where
    P: CameraPublisher,
    C: Clock,
{
    /// Create a new SyncNode with the given configuration.
    ///
    /// Subscribes to every input topic and advertises every output topic
    /// on the transport.
    pub fn new<T>(transport: &T, config: Config, clock: C) -> Result<Self>
    where
        T: Transport<Publisher = P>,
    {
        config.validate()?;
        let period = config.loop_period()?;

        let mut streams = Vec::with_capacity(config.streams.len());
        for stream in &config.streams {
            let rx = transport.subscribe(&stream.input, config.queue_size)?;
            let publisher = transport.advertise(&stream.output, config.queue_size)?;

            info!(
                stream = %stream.name,
                input_topic = %stream.input,
                output_topic = %stream.output,
                "Created stream"
            );

            streams.push(Stream {
                name: stream.name.clone(),
                input_topic: stream.input.clone(),
                output_topic: stream.output.clone(),
                rx,
                publisher,
                connected: true,
            });
        }

        let names = streams.iter().map(|stream| stream.name.clone());
        let sync = Synchronizer::new(names, clock)?;

        info!(
            num_streams = streams.len(),
            max_rate_hz = config.rate.max_rate_hz,
            queue_size = config.queue_size,
            "Creating SyncNode"
        );

        Ok(Self {
            streams,
            sync,
            period,
            config,
        })
    }

    /// Deliver every pending inbound message to the synchronizer.
    ///
    /// Returns the number of messages delivered.
    pub fn spin_once(&mut self) -> usize {
        let mut delivered = 0;

        for stream in self.streams.iter_mut().filter(|stream| stream.connected) {
            loop {
                match stream.rx.try_recv() {
                    Ok(CameraMessage { image, info }) => {
                        if self.sync.ingest(stream.name.clone(), image, info).is_err() {
                            warn!(stream = %stream.name, "No slot for stream, dropping frame");
                            continue;
                        }
                        delivered += 1;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!(
                            stream = %stream.name,
                            input_topic = %stream.input_topic,
                            "Input disconnected"
                        );
                        stream.connected = false;
                        break;
                    }
                }
            }
        }

        delivered
    }

    /// Deliver pending messages, then emit and publish if every stream
    /// has a new frame.
    ///
    /// Returns true if a synchronized set was published.
    pub fn step(&mut self) -> bool {
        let delivered = self.spin_once();
        if delivered > 0 {
            debug!(delivered, "Delivered inbound messages");
        }

        match self.sync.try_emit() {
            Some(emission) => {
                self.publish(emission);
                true
            }
            None => false,
        }
    }

    /// Publish every frame of an emission on its stream's output topic.
    fn publish(&self, emission: Emission<String, Image, CameraInfo>) {
        for (stream, (name, (image, info))) in self.streams.iter().zip(emission) {
            debug_assert_eq!(stream.name, name);

            if let Err(e) = stream.publisher.publish(&image, &info) {
                warn!(
                    stream = %stream.name,
                    output_topic = %stream.output_topic,
                    seq = image.header.seq,
                    error = %e,
                    "Failed to publish synchronized frame"
                );
                // Continue with the other streams
            }
        }
    }

    /// Checks if every input is disconnected and drained.
    pub fn is_finished(&self) -> bool {
        self.streams.iter().all(|stream| !stream.connected)
    }

    /// Run the node loop until `shutdown` resolves or every input closes.
    ///
    /// Each iteration is [step](Self::step); iterations are spaced by the
    /// configured loop period.
    pub async fn run_until<F>(mut self, shutdown: F) -> SyncStats<String>
    where
        F: Future<Output = ()>,
    {
        let period = self.period;
        let stats_interval = self.config.stats_interval;

        info!(
            num_streams = self.streams.len(),
            period = ?period,
            "Starting synchronization loop"
        );

        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut stats_ticker = time::interval_at(Instant::now() + stats_interval, stats_interval);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = stats_ticker.tick() => {
                    self.log_stats();
                }
                _ = ticker.tick() => {
                    self.step();
                    if self.is_finished() {
                        info!("All inputs closed");
                        break;
                    }
                }
            }
        }

        // Log final statistics
        info!("Synchronization loop ended");
        self.log_stats();

        self.sync.stats()
    }

    /// Run the node loop until Ctrl-C or until every input closes.
    pub async fn run(self) -> SyncStats<String> {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Unable to listen for Ctrl-C, running until inputs close");
                futures::future::pending::<()>().await;
            }
        };

        self.run_until(ctrl_c).await
    }

    /// Log current statistics.
    fn log_stats(&self) {
        let stats = self.sync.stats();
        let received: Vec<(&str, u64)> = stats
            .slots
            .iter()
            .map(|(name, slot)| (name.as_str(), slot.received))
            .collect();

        info!(
            emitted = stats.emitted,
            next_sequence = stats.next_sequence,
            received = ?received,
            "Synchronization statistics"
        );
    }

    /// Get current synchronization statistics.
    pub fn stats(&self) -> SyncStats<String> {
        self.sync.stats()
    }

    pub fn synchronizer(&self) -> &StreamSynchronizer<C> {
        &self.sync
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output topics in slot order.
    pub fn output_topics(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|stream| stream.output_topic.as_str())
    }
}
