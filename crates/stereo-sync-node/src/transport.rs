//! The publish/subscribe boundary of the node.
//!
//! The node only needs two things from a transport: a queue of incoming
//! camera messages per input topic, and a [`CameraPublisher`] per output
//! topic. [`ChannelBus`] provides both in-process on top of `flume`
//! channels, which is what the tests and the loopback demo run on.

use eyre::{Result, eyre};
use flume::{Receiver, Sender, TrySendError};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard};
use stereo_sync_core::{CameraInfo, Image};
use tracing::debug;

/// An image together with the camera info that describes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraMessage {
    pub image: Image,
    pub info: CameraInfo,
}

impl CameraMessage {
    pub fn new(image: Image, info: CameraInfo) -> Self {
        Self { image, info }
    }
}

/// Publishes an image and its camera info on one output topic.
pub trait CameraPublisher {
    fn publish(&self, image: &Image, info: &CameraInfo) -> Result<()>;
}

/// Creates subscriptions and publishers.
pub trait Transport {
    type Publisher: CameraPublisher;

    /// Subscribe to a topic. At most `queue_size` undelivered messages
    /// are kept; older ones are discarded first.
    fn subscribe(&self, topic: &str, queue_size: usize) -> Result<Receiver<CameraMessage>>;

    /// Create a publisher on a topic.
    fn advertise(&self, topic: &str, queue_size: usize) -> Result<Self::Publisher>;
}

/// One subscriber queue. The receiver half is kept to evict the oldest
/// message when the queue is full.
#[derive(Debug, Clone)]
struct SubscriberQueue {
    tx: Sender<CameraMessage>,
    rx: Receiver<CameraMessage>,
}

impl SubscriberQueue {
    /// Enqueue a message. Returns false once the subscriber is gone.
    fn push(&self, mut msg: CameraMessage) -> bool {
        loop {
            match self.tx.try_send(msg) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.rx.try_recv();
                    msg = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    fn is_alive(&self) -> bool {
        // The bus itself holds one receiver.
        self.tx.receiver_count() > 1
    }
}

type Topics = IndexMap<String, Vec<SubscriberQueue>>;

/// An in-process message bus keyed by topic name.
///
/// Clones share the same set of topics.
#[derive(Debug, Clone, Default)]
pub struct ChannelBus {
    topics: Arc<Mutex<Topics>>,
}

impl ChannelBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a message to every live subscriber of the topic.
    ///
    /// Returns the number of subscribers that received it.
    pub fn send(&self, topic: &str, msg: CameraMessage) -> Result<usize> {
        let mut topics = self.lock()?;
        let Some(queues) = topics.get_mut(topic) else {
            return Ok(0);
        };

        queues.retain(SubscriberQueue::is_alive);

        let mut delivered = 0;
        if let Some((last, rest)) = queues.split_last() {
            for queue in rest {
                if queue.push(msg.clone()) {
                    delivered += 1;
                }
            }
            if last.push(msg) {
                delivered += 1;
            }
        }

        Ok(delivered)
    }

    /// Number of live subscribers of a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let Ok(topics) = self.lock() else {
            return 0;
        };
        topics
            .get(topic)
            .map(|queues| queues.iter().filter(|queue| queue.is_alive()).count())
            .unwrap_or(0)
    }

    /// Drop every subscriber queue of a topic.
    ///
    /// Subscribers see their channel disconnect once drained.
    pub fn close_topic(&self, topic: &str) -> Result<()> {
        self.lock()?.shift_remove(topic);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Topics>> {
        self.topics
            .lock()
            .map_err(|_| eyre!("Channel bus lock poisoned"))
    }
}

impl Transport for ChannelBus {
    type Publisher = ChannelPublisher;

    fn subscribe(&self, topic: &str, queue_size: usize) -> Result<Receiver<CameraMessage>> {
        let (tx, rx) = flume::bounded(queue_size.max(1));
        let queue = SubscriberQueue { tx, rx: rx.clone() };

        self.lock()?
            .entry(topic.to_string())
            .or_default()
            .push(queue);

        debug!(topic = %topic, queue_size, "Subscribed to topic");
        Ok(rx)
    }

    fn advertise(&self, topic: &str, _queue_size: usize) -> Result<Self::Publisher> {
        Ok(ChannelPublisher {
            bus: self.clone(),
            topic: topic.to_string(),
        })
    }
}

/// Publishes onto a [`ChannelBus`] topic.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    bus: ChannelBus,
    topic: String,
}

impl ChannelPublisher {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl CameraPublisher for ChannelPublisher {
    fn publish(&self, image: &Image, info: &CameraInfo) -> Result<()> {
        let msg = CameraMessage::new(image.clone(), info.clone());
        self.bus.send(&self.topic, msg)?;
        Ok(())
    }
}
