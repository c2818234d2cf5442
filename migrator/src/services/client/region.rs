//! Region resolution
//!
//! Maps the fixed set of platform regions onto the authentication host and
//! the API host. Resolution is pure and happens before any request is built,
//! so an unusable region never reaches the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{ClientError, ClientResult};

/// Platform region an account lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "EU")]
    Europe,
    #[serde(rename = "ASIA")]
    Asia,
    #[serde(rename = "NA")]
    NorthAmerica,
    #[default]
    #[serde(rename = "UNSET")]
    Unset,
}

impl Region {
    pub fn code(&self) -> &'static str {
        match self {
            Region::Europe => "EU",
            Region::Asia => "ASIA",
            Region::NorthAmerica => "NA",
            Region::Unset => "UNSET",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eu" | "europe" => Ok(Region::Europe),
            "asia" => Ok(Region::Asia),
            "na" | "us" | "north-america" | "north_america" | "northamerica" => {
                Ok(Region::NorthAmerica)
            }
            _ => Err(ClientError::InvalidRegion {
                region: value.to_string(),
            }),
        }
    }
}

/// Base URLs for one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    /// Host serving `/oauth2/token/{tenantId}`
    pub auth_base: String,
    /// Host serving the tenant and venue APIs
    pub api_base: String,
}

/// Resolves regions to endpoints for a platform domain
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    base_domain: String,
    endpoint_override: Option<ApiEndpoints>,
}

impl EndpointResolver {
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into(),
            endpoint_override: None,
        }
    }

    /// Route every valid region to fixed endpoints (staging, mock servers)
    pub fn with_override(mut self, endpoints: Option<ApiEndpoints>) -> Self {
        self.endpoint_override = endpoints;
        self
    }

    pub fn resolve(&self, region: Region) -> ClientResult<ApiEndpoints> {
        let prefix = match region {
            Region::Europe => "eu.",
            Region::Asia => "asia.",
            Region::NorthAmerica => "",
            Region::Unset => {
                return Err(ClientError::InvalidRegion {
                    region: region.code().to_string(),
                })
            }
        };

        if let Some(endpoints) = &self.endpoint_override {
            return Ok(endpoints.clone());
        }

        Ok(ApiEndpoints {
            auth_base: format!("https://{}{}", prefix, self.base_domain),
            api_base: format!("https://api.{}{}", prefix, self.base_domain),
        })
    }
}
