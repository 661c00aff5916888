use autopilot_foundation::AudioError;
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

pub struct DeviceManager {
    host: Host,
}

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
}

impl DeviceManager {
    pub fn new() -> Result<Self, AudioError> {
        Ok(Self {
            host: cpal::default_host(),
        })
    }

    pub fn host_id(&self) -> cpal::HostId {
        self.host.id()
    }

    pub fn enumerate_devices(&self) -> Vec<DeviceInfo> {
        let default_name = self.default_input_device_name();
        let mut devices = Vec::new();
        if let Ok(inputs) = self.host.input_devices() {
            for device in inputs {
                if let Ok(name) = device.name() {
                    let is_default = default_name.as_deref() == Some(name.as_str());
                    devices.push(DeviceInfo { name, is_default });
                }
            }
        }
        devices
    }

    pub fn default_input_device_name(&self) -> Option<String> {
        self.host.default_input_device().and_then(|d| d.name().ok())
    }

    pub fn open_input(&self, name: Option<&str>) -> Result<Device, AudioError> {
        let device = match name {
            Some(n) => self
                .host
                .input_devices()
                .map_err(|_| AudioError::DeviceNotFound {
                    name: Some(n.to_string()),
                })?
                .find(|d| d.name().map(|dn| dn == n).unwrap_or(false)),
            None => self.host.default_input_device(),
        };
        device.ok_or(AudioError::DeviceNotFound {
            name: name.map(str::to_string),
        })
    }
}
