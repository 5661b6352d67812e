use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::notification::NotificationDispatcher;
use crate::queue::JobQueue;
use crate::template::TemplateRegistry;
use crate::transport::{Sender, TransportManager};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<TemplateRegistry>,
    pub transport: Arc<TransportManager>,
    pub queue: Arc<dyn JobQueue>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the dispatcher from already constructed services
    pub fn new(
        settings: Settings,
        registry: Arc<TemplateRegistry>,
        transport: Arc<TransportManager>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            registry.clone(),
            transport.clone(),
            queue.clone(),
            Sender::from_config(&settings.smtp),
        ));

        Self {
            settings: Arc::new(settings),
            registry,
            transport,
            queue,
            dispatcher,
            start_time: Instant::now(),
        }
    }
}
