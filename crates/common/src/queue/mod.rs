//! Durable job queue
//!
//! SQS-compatible queue wrapper providing at-least-once delivery:
//! a received message stays invisible for the visibility timeout and is
//! redelivered unless acked. The broker counts deliveries, which bounds
//! retries of poisoned messages.

use crate::config::QueueConfig;
use crate::errors::{AppError, Result};
use aws_sdk_sqs::types::{Message, MessageSystemAttributeName};
use aws_sdk_sqs::Client as SqsClient;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// A received message with its delivery metadata
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Opaque handle used to ack the message
    pub receipt_handle: String,
    /// Raw message body
    pub body: String,
    /// How many times the broker has delivered this message (starts at 1)
    pub receive_count: u32,
}

/// Queue client wrapper
pub struct JobQueue {
    client: SqsClient,
    url: String,
    visibility_timeout: i32,
    wait_time: i32,
}

impl JobQueue {
    /// Create a new queue client from ambient AWS configuration
    pub async fn new(config: &QueueConfig) -> Result<Self> {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Ok(Self::with_client(SqsClient::new(&aws_config), config))
    }

    /// Create with an existing client
    pub fn with_client(client: SqsClient, config: &QueueConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            visibility_timeout: config.visibility_timeout_secs,
            wait_time: config.wait_time_secs,
        }
    }

    /// Publish a message to the queue
    pub async fn send<T: Serialize>(&self, message: &T) -> Result<String> {
        let body = serde_json::to_string(message)?;

        let result = self
            .client
            .send_message()
            .queue_url(&self.url)
            .message_body(&body)
            .send()
            .await
            .map_err(|e| AppError::Queue {
                message: format!("failed to send message: {}", e),
            })?;

        let message_id = result.message_id.unwrap_or_default();
        debug!(message_id = %message_id, "Message published");

        Ok(message_id)
    }

    /// Receive pending messages with long polling
    pub async fn receive(&self) -> Result<Vec<Delivery>> {
        let result = self
            .client
            .receive_message()
            .queue_url(&self.url)
            .max_number_of_messages(10)
            .visibility_timeout(self.visibility_timeout)
            .wait_time_seconds(self.wait_time)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| AppError::Queue {
                message: format!("failed to receive messages: {}", e),
            })?;

        let messages = result.messages.unwrap_or_default();
        debug!(count = messages.len(), "Messages received");

        Ok(messages.into_iter().filter_map(into_delivery).collect())
    }

    /// Ack a message so the broker will not redeliver it
    pub async fn ack(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| AppError::Queue {
                message: format!("failed to ack message: {}", e),
            })?;

        debug!("Message acked");
        Ok(())
    }

    /// Parse a delivery body as JSON
    pub fn parse<T: DeserializeOwned>(delivery: &Delivery) -> Result<T> {
        serde_json::from_str(&delivery.body).map_err(|e| AppError::Queue {
            message: format!("failed to parse message: {}", e),
        })
    }
}

fn into_delivery(message: Message) -> Option<Delivery> {
    let receipt_handle = message.receipt_handle?;
    let body = message.body?;

    let receive_count = message
        .attributes
        .as_ref()
        .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    Some(Delivery {
        receipt_handle,
        body,
        receive_count,
    })
}
