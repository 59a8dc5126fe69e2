//! System health checks

use corpora_common::db::Repository;
use corpora_common::llm::LlmClient;
use corpora_common::vector::VectorStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthComponents {
    pub metadata: ComponentStatus,
    pub vector: ComponentStatus,
    pub llm: ComponentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub components: HealthComponents,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Probe every backing component. The overall status is unhealthy as soon
/// as any component is down.
pub async fn check_health(
    repo: &Repository,
    vector: &Arc<dyn VectorStore>,
    llm: &Arc<dyn LlmClient>,
) -> HealthStatus {
    let metadata = status_of(repo.ping().await.is_ok());
    let vector = status_of(vector.ping().await.is_ok());
    let llm = status_of(llm.health().await.is_ok());

    let all_up = [metadata, vector, llm]
        .iter()
        .all(|s| *s == ComponentStatus::Up);

    HealthStatus {
        status: if all_up { "healthy" } else { "unhealthy" }.to_string(),
        components: HealthComponents {
            metadata,
            vector,
            llm,
        },
    }
}

fn status_of(up: bool) -> ComponentStatus {
    if up {
        ComponentStatus::Up
    } else {
        ComponentStatus::Down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_status_serialization() {
        assert_eq!(serde_json::to_string(&ComponentStatus::Up).unwrap(), "\"up\"");
        assert_eq!(serde_json::to_string(&ComponentStatus::Down).unwrap(), "\"down\"");
    }

    #[test]
    fn test_overall_status() {
        let status = HealthStatus {
            status: "unhealthy".into(),
            components: HealthComponents {
                metadata: ComponentStatus::Up,
                vector: ComponentStatus::Down,
                llm: ComponentStatus::Up,
            },
        };
        assert!(!status.is_healthy());
    }
}
