// SPDX-License-Identifier: Apache-2.0

//! Shared argument and output helpers for the subcommands.

use crate::error::CliError;
use clap::{Args as ClapArgs, ValueEnum};
use mediactl::{InfoField, MediaDevice};
use serde::Serialize;

/// How to select the media device a subcommand operates on: an explicit
/// node path, or discovery by an info-field glob pattern.
#[derive(ClapArgs, Debug)]
pub struct DeviceArgs {
    /// Media device node path
    #[arg(short, long, default_value = "/dev/media0")]
    pub device: String,

    /// Discover the device by glob pattern instead of a path (e.g. "imx8*")
    #[arg(long, conflicts_with = "device")]
    pub find: Option<String>,

    /// Device info field the --find pattern is matched against
    #[arg(long, value_enum, default_value_t = FindField::Model)]
    pub by: FindField,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindField {
    Driver,
    Model,
    Serial,
    Bus,
}

impl From<FindField> for InfoField {
    fn from(field: FindField) -> Self {
        match field {
            FindField::Driver => InfoField::Driver,
            FindField::Model => InfoField::Model,
            FindField::Serial => InfoField::Serial,
            FindField::Bus => InfoField::BusInfo,
        }
    }
}

impl DeviceArgs {
    pub fn open(&self) -> Result<MediaDevice, CliError> {
        let device = match &self.find {
            Some(pattern) => MediaDevice::open_matching(self.by.into(), pattern)?,
            None => MediaDevice::open(&self.device)?,
        };
        Ok(device)
    }
}

/// Device information in serializable form, shared by `devices` and `info`.
#[derive(Debug, Serialize)]
pub struct InfoOutput {
    pub driver: String,
    pub model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub serial: String,
    pub bus_info: String,
    pub media_version: String,
    pub driver_version: String,
    pub hw_revision: u32,
}

impl From<&mediactl::DeviceInfo> for InfoOutput {
    fn from(info: &mediactl::DeviceInfo) -> Self {
        InfoOutput {
            driver: info.driver.clone(),
            model: info.model.clone(),
            serial: info.serial.clone(),
            bus_info: info.bus_info.clone(),
            media_version: info.media_version.to_string(),
            driver_version: info.driver_version.to_string(),
            hw_revision: info.hw_revision,
        }
    }
}

pub fn to_json_string<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))
}
