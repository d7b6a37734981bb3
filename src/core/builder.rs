use std::sync::Arc;

use crate::{core::Config, subscribers::Subscribe};

use super::controller::Controller;

/// Builder for constructing a [`Controller`] with optional subscribers.
pub struct ControllerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers, replacing any added before.
    ///
    /// Subscribers receive every runtime event through dedicated workers with
    /// bounded queues, and are drained before [`Controller::run`] returns.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the controller. Nothing is spawned until [`Controller::run`].
    pub fn build(self) -> Controller {
        Controller::new_internal(self.cfg, self.subscribers)
    }
}
