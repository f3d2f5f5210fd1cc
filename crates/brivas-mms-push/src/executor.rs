//! Performs the UI, retrieval and recycling side effects of an [`Action`]

use crate::action::Action;
use crate::errors::PushError;
use crate::store::{MessageStore, NotificationUi, RetrievalService, WidgetUi};
use crate::types::TransactionType;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct ActionExecutor {
    store: Arc<dyn MessageStore>,
    notifications: Arc<dyn NotificationUi>,
    widget: Arc<dyn WidgetUi>,
    retrieval: Arc<dyn RetrievalService>,
}

impl ActionExecutor {
    pub fn new(
        store: Arc<dyn MessageStore>,
        notifications: Arc<dyn NotificationUi>,
        widget: Arc<dyn WidgetUi>,
        retrieval: Arc<dyn RetrievalService>,
    ) -> Self {
        Self {
            store,
            notifications,
            widget,
            retrieval,
        }
    }

    #[instrument(skip_all, fields(outcome = action.outcome()))]
    pub async fn execute(&self, action: &Action) -> Result<(), PushError> {
        match action {
            Action::PersistNotificationAndMaybeRetrieve {
                retrieve: true,
                uri,
                subscription_id,
                ..
            } => {
                debug!(%uri, "Starting notification transaction");
                self.retrieval
                    .start(uri, TransactionType::Notification, *subscription_id)
                    .await?;
            }
            Action::PersistNotificationAndMaybeRetrieve {
                retrieve: false,
                thread_id,
                ..
            }
            | Action::UpdateIndicatorOnly { thread_id } => {
                self.notifications.update_indicator(*thread_id, false).await?;
            }
            Action::LegacyDelivered { thread_id } => {
                self.store.delete_old(*thread_id).await?;
                self.notifications.update_indicator(*thread_id, false).await?;
                self.widget.notify_changed().await?;
            }
            Action::PersistAndPatchThread { .. }
            | Action::Drop { .. }
            | Action::Unrecognized { .. } => {}
        }
        Ok(())
    }
}
