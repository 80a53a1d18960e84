//! Mapping of `config.yaml` overrides onto engine and client settings

use spheresweep_config::{EndpointsConfig, FileConfig, StageConfig};
use spheresweep_datasphere::Endpoints;
use spheresweep_engine::{StageSettings, SweepSettings};
use std::time::Duration;

pub fn endpoints(config: &EndpointsConfig) -> Endpoints {
    let mut endpoints = Endpoints::default();
    if let Some(iam) = &config.iam {
        endpoints.iam = iam.clone();
    }
    if let Some(datasphere) = &config.datasphere {
        endpoints.datasphere = datasphere.clone();
    }
    if let Some(operations) = &config.operations {
        endpoints.operations = operations.clone();
    }
    endpoints
}

pub fn sweep_settings(config: &FileConfig) -> SweepSettings {
    let defaults = SweepSettings::default();
    SweepSettings {
        projects: apply(defaults.projects, &config.projects),
        communities: apply(defaults.communities, &config.communities),
    }
}

fn apply(mut stage: StageSettings, overrides: &StageConfig) -> StageSettings {
    if let Some(ms) = overrides.pacing_ms {
        stage.pacing = Duration::from_millis(ms);
    }
    if let Some(attempts) = overrides.max_attempts {
        stage.retry.max_attempts = attempts;
    }
    if let Some(ms) = overrides.retry_delay_ms {
        stage.retry.delay = Duration::from_millis(ms);
    }
    if let Some(ms) = overrides.poll_initial_delay_ms {
        stage.poll.initial_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = overrides.poll_interval_ms {
        stage.poll.interval = Duration::from_millis(ms);
    }
    if let Some(polls) = overrides.max_polls {
        stage.poll.max_polls = polls;
    }
    stage
}
