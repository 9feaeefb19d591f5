use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::api::CloudApi;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{command_message, command_path, parse_serial, parse_status, status_path, SYSTEMS_PATH};
use crate::types::*;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://nimbus.actronair.com.au";

pub struct CloudClientBuilder {
    base_url: String,
    log_mode: Option<MessageLogMode>,
    log_path: Option<PathBuf>,
}

impl CloudClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<PathBuf>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<CloudClient> {
        let http = reqwest::Client::builder().build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(MessageLogger::new(mode, path)?)),
            _ => None,
        };

        Ok(CloudClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            session: RwLock::new(None),
            logger,
        })
    }
}

#[derive(Clone)]
struct Session {
    token: String,
    serial: String,
}

/// [`CloudApi`] over the vendor's REST API, authenticated with a bearer token.
pub struct CloudClient {
    http: reqwest::Client,
    base_url: String,
    session: RwLock<Option<Session>>,
    logger: Option<Mutex<MessageLogger>>,
}

impl CloudClient {
    pub fn builder(base_url: impl Into<String>) -> CloudClientBuilder {
        CloudClientBuilder::new(base_url)
    }

    pub fn serial(&self) -> Option<String> {
        self.current_session().map(|s| s.serial)
    }

    async fn lookup_serial(&self, token: &str) -> Result<Option<String>> {
        let url = format!("{}{}", self.base_url, SYSTEMS_PATH);
        debug!(url = %url, "looking up ac systems");
        self.log(|l| l.log_request("GET", SYSTEMS_PATH));

        let body: Value = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_serial(&body))
    }

    fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn log(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(ref logger) = self.logger {
            f(&mut logger.lock().unwrap_or_else(PoisonError::into_inner));
        }
    }
}

#[async_trait]
impl CloudApi for CloudClient {
    async fn initialize(&self, credentials: &Credentials) -> Result<Option<String>> {
        let serial = match credentials.serial.as_deref().filter(|s| !s.is_empty()) {
            Some(serial) => Some(serial.to_string()),
            None => self.lookup_serial(&credentials.access_token).await?,
        };

        if let Some(ref serial) = serial {
            *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(Session {
                token: credentials.access_token.clone(),
                serial: serial.clone(),
            });
        }
        Ok(serial)
    }

    async fn get_status(&self) -> Result<HvacStatus> {
        let session = self.current_session().ok_or(Error::NotInitialized)?;
        let path = status_path(&session.serial);
        self.log(|l| l.log_request("GET", &path));

        let resp = match self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&session.token)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("status request failed: {e}");
                return Ok(HvacStatus::api_error());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "status request rejected");
            return Ok(HvacStatus::api_error());
        }

        let body: Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("invalid status body: {e}");
                return Ok(HvacStatus::api_error());
            }
        };
        trace!("status body received");
        self.log(|l| l.log_status(status.as_u16(), &body));

        Ok(parse_status(&body))
    }

    async fn run_command(&self, command: &Command) -> Result<CommandResult> {
        let session = self.current_session().ok_or(Error::NotInitialized)?;
        let body = command_message(command)
            .ok_or_else(|| Error::Protocol(format!("{command} has no wire representation")))?;

        let mut id = None;
        self.log(|l| id = Some(l.log_command(&command.to_string(), &body)));

        let result = match self
            .http
            .post(format!("{}{}", self.base_url, command_path(&session.serial)))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => CommandResult::Success,
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), command = %command, "command rejected");
                CommandResult::Failure
            }
            Err(e) => {
                debug!(command = %command, "command not delivered: {e}");
                CommandResult::Unreachable
            }
        };

        if let Some(id) = id {
            self.log(|l| l.log_command_result(id, &format!("{result:?}")));
        }
        Ok(result)
    }
}
