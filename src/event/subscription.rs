use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handler::ChannelEventHandler;

/// Routes the events of one channel to a handler on a background task
pub struct ChannelSubscription<E: Send + 'static> {
    channel_id: String,
    handler: Arc<dyn ChannelEventHandler<E>>,
    receiver: broadcast::Receiver<E>,
}

impl<E> ChannelSubscription<E>
where
    E: Clone + Debug + Send + 'static,
{
    pub fn new(
        channel_id: String,
        handler: Arc<dyn ChannelEventHandler<E>>,
        receiver: broadcast::Receiver<E>,
    ) -> Self {
        Self {
            channel_id,
            handler,
            receiver,
        }
    }

    /// Spawns the forwarding task. It ends when the channel is closed.
    pub fn start(self) -> JoinHandle<()> {
        let Self {
            channel_id,
            handler,
            mut receiver,
        } = self;
        let handler_name = handler.handler_name();

        info!(
            channel_id = %channel_id,
            handler = handler_name,
            "Starting channel subscription"
        );

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        debug!(
                            channel_id = %channel_id,
                            handler = handler_name,
                            event = ?event,
                            "Received channel event"
                        );

                        if let Err(e) = handler.handle_event(&channel_id, event).await {
                            warn!(
                                channel_id = %channel_id,
                                handler = handler_name,
                                error = %e,
                                "Channel event handler failed"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            channel_id = %channel_id,
                            handler = handler_name,
                            skipped,
                            "Channel subscription lagged, events skipped"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            info!(
                channel_id = %channel_id,
                handler = handler_name,
                "Channel subscription ended - no more events"
            );
        })
    }
}
