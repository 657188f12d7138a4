use std::sync::Arc;

use async_trait::async_trait;

use super::{
    NotificationSink, error::SinkError, payload::NotificationPayload, template::TemplateService,
};
use crate::config::StdoutSinkConfig;

/// A sink that prints notifications to standard output.
pub struct StdoutSink {
    config: StdoutSinkConfig,
    templates: Arc<TemplateService>,
}

impl StdoutSink {
    /// Creates a new `StdoutSink` with the given configuration and template
    /// service.
    pub fn new(config: StdoutSinkConfig, templates: Arc<TemplateService>) -> Self {
        Self { config, templates }
    }
}

#[async_trait]
impl NotificationSink for StdoutSink {
    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), SinkError> {
        let context = payload.context()?;

        if let Some(message) = &self.config.message {
            let title = self.templates.render(&message.title, context.clone())?;
            let body = self.templates.render(&message.body, context.clone())?;
            println!("=== Notification ({}) ===\n{}\n{}\n", payload.kind(), title, body);
        } else {
            println!("=== Notification ({}) ===\n{}\n", payload.kind(), context);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnrichedAlert, NotificationMessage};
    use crate::test_helpers::AlertBuilder;

    #[tokio::test]
    async fn delivers_without_message_template() {
        let sink = StdoutSink::new(StdoutSinkConfig::default(), Arc::new(TemplateService::new()));
        let payload = NotificationPayload::Alert(EnrichedAlert {
            alert: AlertBuilder::new().build(),
            reputation: None,
        });
        assert!(sink.deliver(&payload).await.is_ok());
    }

    #[tokio::test]
    async fn delivers_with_message_template() {
        let config = StdoutSinkConfig {
            message: Some(NotificationMessage {
                title: "{{ alert.filename }}".to_string(),
                body: "severity {{ alert.severity }}".to_string(),
            }),
        };
        let sink = StdoutSink::new(config, Arc::new(TemplateService::new()));
        let payload = NotificationPayload::Alert(EnrichedAlert {
            alert: AlertBuilder::new().build(),
            reputation: None,
        });
        assert!(sink.deliver(&payload).await.is_ok());
    }
}
