//! Left mouse button as the push-to-talk trigger.
//!
//! Reads the kernel's key state through evdev, so it works the same under
//! X11, Wayland and a bare console. The user must be able to read
//! /dev/input/* (usually via the 'input' group).

use super::Activation;
use crate::config::InputConfig;
use evdev::{Device, Key};
use std::time::{Duration, Instant};

pub struct MouseButton {
    /// Case-insensitive fragment of the device name.
    name_filter: String,
    device: Option<Device>,
    rescan_interval: Duration,
    last_scan: Option<Instant>,
    warned_missing: bool,
}

impl MouseButton {
    pub fn new(config: &InputConfig) -> Self {
        let mut button = Self {
            name_filter: config.device_name.to_lowercase(),
            device: None,
            rescan_interval: config.rescan_interval(),
            last_scan: None,
            warned_missing: false,
        };
        button.rescan();
        button
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    fn rescan(&mut self) {
        self.last_scan = Some(Instant::now());

        let found = evdev::enumerate().find(|(_, device)| {
            matches_name(device.name(), &self.name_filter)
                && device
                    .supported_keys()
                    .map_or(false, |keys| keys.contains(Key::BTN_LEFT))
        });

        match found {
            Some((path, device)) => {
                tracing::info!(
                    "Using input device {:?} at {}",
                    device.name().unwrap_or("unnamed"),
                    path.display()
                );
                self.device = Some(device);
                self.warned_missing = false;
            }
            None => {
                if !self.warned_missing {
                    tracing::warn!(
                        "No input device matching '{}' with a left button found; will keep looking",
                        self.name_filter
                    );
                    self.warned_missing = true;
                }
            }
        }
    }

    fn rescan_due(&self) -> bool {
        self.last_scan
            .map_or(true, |at| at.elapsed() >= self.rescan_interval)
    }
}

impl Activation for MouseButton {
    fn is_engaged(&mut self) -> bool {
        if self.device.is_none() {
            if !self.rescan_due() {
                return false;
            }
            self.rescan();
        }

        let Some(device) = self.device.as_ref() else {
            return false;
        };

        match device.get_key_state() {
            Ok(keys) => keys.contains(Key::BTN_LEFT),
            Err(e) => {
                tracing::warn!("Lost input device: {}", e);
                self.device = None;
                self.last_scan = Some(Instant::now());
                false
            }
        }
    }
}

fn matches_name(name: Option<&str>, filter: &str) -> bool {
    name.map_or(false, |name| name.to_lowercase().contains(filter))
}
