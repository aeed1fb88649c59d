//! Leviton Decora Smart cloud controller.
//!
//! Drives one Wi-Fi plug through the My Leviton REST API:
//!
//! | Call                                   | Purpose               |
//! |----------------------------------------|-----------------------|
//! | `POST /Person/login`                   | session token (`id`)  |
//! | `PUT  /IotSwitches/{device}`           | `{"power":"ON"}`      |
//! | `GET  /IotSwitches/{device}`           | current power state   |
//! | `GET  /Residences/{residence}/iotSwitches` | device listing    |
//!
//! Login happens lazily before the first call. A 401 on a later call
//! drops the token, logs in again and retries that call once.

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::app::ports::{DeviceController, PowerState};
use crate::config::LevitonSettings;
use crate::error::RemoteError;

pub const LEVITON_API: &str = "https://my.leviton.com/api";

/// One switch from the residence listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwitchInfo {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "model")]
    pub r#type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
}

#[derive(Deserialize)]
struct SwitchStatus {
    power: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    id: Option<String>,
}

pub struct LevitonController {
    client: Client,
    base_url: String,
    email: String,
    password: String,
    residence_id: String,
    device_id: String,
    token: Option<String>,
}

impl LevitonController {
    pub fn new(settings: &LevitonSettings, timeout: Duration) -> Result<Self, RemoteError> {
        Self::with_base_url(settings, timeout, LEVITON_API)
    }

    /// Point at another API root (a test stub).
    pub fn with_base_url(
        settings: &LevitonSettings,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: settings.email.clone(),
            password: settings.password.clone(),
            residence_id: settings.residence_id.clone(),
            device_id: settings.device_id.clone(),
            token: None,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Exchange credentials for a session token.
    pub fn login(&mut self) -> Result<(), RemoteError> {
        self.token = None;
        let response = self
            .client
            .post(format!("{}/Person/login", self.base_url))
            .json(&json!({ "email": self.email, "password": self.password }))
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::Auth(format!("login rejected (HTTP {status})")));
        }
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body: LoginResponse = response
            .json()
            .map_err(|e| RemoteError::Decode(e.without_url().to_string()))?;
        let token = body
            .id
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RemoteError::Auth("login response has no token".into()))?;
        self.token = Some(token);
        info!("Successfully logged in to Leviton");
        Ok(())
    }

    /// Current power state of the configured plug.
    pub fn power_status(&mut self) -> Result<PowerState, RemoteError> {
        let endpoint = format!("IotSwitches/{}", self.device_id);
        let status: SwitchStatus = decode(self.call(Method::GET, &endpoint, None)?)?;
        match status.power.to_ascii_uppercase().as_str() {
            "ON" => Ok(PowerState::On),
            "OFF" => Ok(PowerState::Off),
            other => Err(RemoteError::Decode(format!("unknown power state {other:?}"))),
        }
    }

    /// Every switch in the configured residence.
    pub fn list_devices(&mut self) -> Result<Vec<SwitchInfo>, RemoteError> {
        let endpoint = format!("Residences/{}/iotSwitches", self.residence_id);
        decode(self.call(Method::GET, &endpoint, None)?)
    }

    /// Authenticated call with lazy login and one re-login on 401.
    fn call(
        &mut self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, RemoteError> {
        let mut relogged = false;
        loop {
            let token = match &self.token {
                Some(t) => t.clone(),
                None => {
                    self.login()?;
                    relogged = true;
                    self.token.clone().unwrap_or_default()
                }
            };

            let url = format!("{}/{endpoint}", self.base_url);
            let mut request: RequestBuilder = self
                .client
                .request(method.clone(), url)
                .header("Authorization", token);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send()?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !relogged {
                debug!("Leviton session expired, logging in again");
                self.token = None;
                continue;
            }
            if status == StatusCode::UNAUTHORIZED {
                self.token = None;
                return Err(RemoteError::Auth("session rejected after fresh login".into()));
            }
            if !status.is_success() {
                return Err(RemoteError::Http {
                    status: status.as_u16(),
                    body: response.text().unwrap_or_default(),
                });
            }

            let text = response.text()?;
            if text.trim().is_empty() {
                return Ok(serde_json::Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()));
        }
    }
}

impl DeviceController for LevitonController {
    fn set_power(&mut self, state: PowerState) -> Result<(), RemoteError> {
        let endpoint = format!("IotSwitches/{}", self.device_id);
        self.call(Method::PUT, &endpoint, Some(&json!({ "power": state.as_str() })))?;
        info!("Plug {} set to {state}", self.device_id);
        Ok(())
    }
}

fn decode<T: for<'de> Deserialize<'de>>(value: serde_json::Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn id_as_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }
    Ok(match Id::deserialize(de)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}
