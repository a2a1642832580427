use super::JobService;
use crate::config::{AgentConfig, SecretString, env};
use crate::error::{Error, Result};
use crate::types::{Job, JobId};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// HTTP client for the agent service's task API
#[derive(Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Deserialize)]
struct RunTaskResponse {
    id: Option<String>,
}

impl AgentClient {
    /// Create a client from the agent section of the configuration
    ///
    /// # Errors
    /// Returns a configuration error if the API key is missing, or a network
    /// error if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::config(
                env::AGENT_API_KEY,
                format!("{} is not set in the environment", env::AGENT_API_KEY),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("script-voice-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn task_url(&self, job_id: &JobId) -> String {
        format!(
            "{}/api/v1/task/{}",
            self.base_url,
            urlencoding::encode(job_id.as_str())
        )
    }
}

#[async_trait]
impl JobService for AgentClient {
    async fn submit(&self, instructions: &str) -> Result<JobId> {
        let response = self
            .http
            .post(format!("{}/api/v1/run-task", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&serde_json::json!({ "task": instructions }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "agent rejected task submission");
            return Err(Error::Submission {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<RunTaskResponse>(&body) {
            Ok(RunTaskResponse { id: Some(id) }) if !id.is_empty() => {
                tracing::info!(job_id = %id, "submitted agent task");
                Ok(JobId::new(id))
            }
            _ => {
                tracing::error!(status = status.as_u16(), body = %body, "task submission response carried no id");
                Err(Error::Submission {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn fetch(&self, job_id: &JobId) -> Result<Job> {
        let response = self
            .http
            .get(self.task_url(job_id))
            .bearer_auth(self.api_key.expose())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::Lookup {
                job_id: job_id.to_string(),
                reason: "unknown task id".into(),
            });
        }
        if !status.is_success() {
            return Err(Error::Lookup {
                job_id: job_id.to_string(),
                reason: format!("agent returned {status}: {body}"),
            });
        }

        let mut job: Job = serde_json::from_str(&body).map_err(|e| Error::Lookup {
            job_id: job_id.to_string(),
            reason: format!("malformed task detail: {e}"),
        })?;
        if job.id.as_str().is_empty() {
            job.id = job_id.clone();
        }
        Ok(job)
    }
}
