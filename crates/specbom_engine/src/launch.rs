use bom_logging::bom_info;
use serde::Serialize;

use crate::store::JobExecutor;
use crate::StoreError;

pub const DEFAULT_INTERACTION: &str = "SpecToBOM@1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    pub interaction: String,
    pub environment: Option<String>,
    pub model: Option<String>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            interaction: DEFAULT_INTERACTION.to_string(),
            environment: None,
            model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchRequest {
    /// Content source of a registered spec object.
    pub file: String,
    pub interaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<RunConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl LaunchRequest {
    pub fn new(content_source: impl Into<String>, settings: &LaunchSettings) -> Self {
        let config = if settings.environment.is_some() || settings.model.is_some() {
            Some(RunConfig {
                environment: settings.environment.clone(),
                model: settings.model.clone(),
            })
        } else {
            None
        };
        Self {
            file: content_source.into(),
            interaction: settings.interaction.clone(),
            config,
        }
    }
}

/// Starts a generation run. `Ok(None)` means the platform accepted the run
/// without reporting an id.
pub async fn launch(
    executor: &dyn JobExecutor,
    content_source: &str,
    settings: &LaunchSettings,
) -> Result<Option<String>, StoreError> {
    let request = LaunchRequest::new(content_source, settings);
    let job_id = executor.execute_async(&request).await?;
    match &job_id {
        Some(id) => bom_info!("Launched {} for {} as {}", request.interaction, content_source, id),
        None => bom_info!(
            "Launched {} for {} (no job id returned)",
            request.interaction,
            content_source
        ),
    }
    Ok(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_is_omitted_when_unset() {
        let request = LaunchRequest::new("up-1", &LaunchSettings::default());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"file": "up-1", "interaction": "SpecToBOM@1"})
        );
    }

    #[test]
    fn config_carries_only_set_fields() {
        let settings = LaunchSettings {
            environment: Some("env-7".into()),
            ..LaunchSettings::default()
        };
        let request = LaunchRequest::new("up-1", &settings);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"file": "up-1", "interaction": "SpecToBOM@1", "config": {"environment": "env-7"}})
        );
    }
}
