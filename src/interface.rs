use crate::error::{Result, WanderError};
use crate::nmcli;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiInterface {
    pub name: String,
    pub state: String,
}

/// List all WiFi interfaces NetworkManager knows about
pub fn list_wifi_interfaces() -> Result<Vec<WifiInterface>> {
    let stdout = nmcli::query(&["-t", "-f", "DEVICE,TYPE,STATE", "device"])?;
    Ok(parse_device_list(&stdout))
}

fn parse_device_list(stdout: &str) -> Vec<WifiInterface> {
    stdout
        .lines()
        .filter_map(|line| {
            let parts = nmcli::split_terse(line);
            match parts.as_slice() {
                [name, kind, state, ..] if kind == "wifi" => Some(WifiInterface {
                    name: name.clone(),
                    state: state.clone(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Get a specific interface by name, verifying it's a WiFi interface
pub fn get_interface(name: &str) -> Result<WifiInterface> {
    list_wifi_interfaces()?
        .into_iter()
        .find(|i| i.name == name)
        .ok_or_else(|| WanderError::InterfaceNotFound(name.to_string()))
}
