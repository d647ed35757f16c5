use railbus_hal::gpio::BusWiring;
use serde::{Deserialize, Serialize};
use std::{fs::File, io, path::Path, time::Duration};
use thiserror::Error;
use crate::trace::trace_helper::TraceHelper;

#[derive(Debug, Error)]
pub enum ConfigError
{
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("pin {0} is assigned to more than one bus line")]
    DuplicatePin(u8),

    #[error("invalid value: {0}")]
    InvalidValue(String)
}

/// # BusConfig
/// Runtime settings, read from a JSON file. Every field
/// is optional in the file, missing fields take the
/// defaults below.
/// * wiring: pin assignment and line polarity
/// * strobe_hold_us: how long the strobe lines stay asserted
/// * bus_timeout_ms: how long to wait for the bus before
///   giving up with "busy"
/// * max_subscribers: cap on pending change subscriptions
/// * message_timeout_ms: long poll timeout of /messages
/// * poll_interval_ms: pause between two poll passes, 0
///   means just yield
/// * status_interval_ms: period of the poller status trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig
{
    pub wiring: BusWiring,
    pub strobe_hold_us: u64,
    pub bus_timeout_ms: u64,
    pub max_subscribers: usize,
    pub message_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub status_interval_ms: u64,
    pub http_address: String,
    pub ui_dir: Option<String>
}

impl Default for BusConfig
{
    fn default() -> Self
    {
        BusConfig
        {
            wiring: BusWiring::default(),
            strobe_hold_us: 5,
            bus_timeout_ms: 50,
            max_subscribers: 100,
            message_timeout_ms: 30000,
            poll_interval_ms: 0,
            status_interval_ms: 1000,
            http_address: "0.0.0.0:8080".to_string(),
            ui_dir: None
        }
    }
}

impl BusConfig
{
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, ConfigError>
    {
        let cfg: BusConfig = serde_json::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file<Pa: AsRef<Path>>(path: Pa) -> Result<Self, ConfigError>
    {
        Self::from_reader(File::open(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError>
    {
        let mut seen: Vec<u8> = Vec::new();
        for pin in self.wiring.bus_pins()
        {
            if seen.contains(&pin)
            {
                return Err(ConfigError::DuplicatePin(pin));
            }
            seen.push(pin);
        }

        if self.bus_timeout_ms == 0
        {
            return Err(ConfigError::InvalidValue("bus_timeout_ms must be > 0".to_string()));
        }
        if self.max_subscribers == 0
        {
            return Err(ConfigError::InvalidValue("max_subscribers must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn strobe_hold(&self) -> Duration
    {
        Duration::from_micros(self.strobe_hold_us)
    }

    pub fn bus_timeout(&self) -> Duration
    {
        Duration::from_millis(self.bus_timeout_ms)
    }

    pub fn message_timeout(&self) -> Duration
    {
        Duration::from_millis(self.message_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration
    {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn status_interval(&self) -> Duration
    {
        Duration::from_millis(self.status_interval_ms)
    }
}

/// Loads the config file at `path`. A missing file is
/// not an error, the defaults are used instead.
pub fn load_or_default<Pa: AsRef<Path>>(path: Pa, tracer: &TraceHelper) -> Result<BusConfig, ConfigError>
{
    match BusConfig::from_file(&path)
    {
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound =>
        {
            tracer.warn(format!("{} not found, using defaults", path.as_ref().display()));
            Ok(BusConfig::default())
        },
        other => other
    }
}

#[cfg(test)]
mod tests {
    use crate::cfg::*;
    use crate::core::channel_manager::ChannelManager;
    use railbus_hal::gpio::Polarity;

    #[test]
    fn empty_object_yields_defaults()
    {
        let cfg = BusConfig::from_reader("{}".as_bytes()).unwrap();
        assert_eq!(BusConfig::default(), cfg);
    }

    #[test]
    fn partial_config_overrides_only_given_fields()
    {
        let json = r#"{ "bus_timeout_ms": 10, "wiring": { "enable": 27, "drive_polarity": "active_high" } }"#;
        let cfg = BusConfig::from_reader(json.as_bytes()).unwrap();
        assert_eq!(Duration::from_millis(10), cfg.bus_timeout());
        assert_eq!(27, cfg.wiring.enable);
        assert_eq!(3, cfg.wiring.read);
        assert_eq!(Polarity::ActiveHigh, cfg.wiring.drive_polarity);
        assert_eq!(100, cfg.max_subscribers);
    }

    #[test]
    fn duplicate_pin_is_rejected()
    {
        let json = r#"{ "wiring": { "write": 17 } }"#;
        let res = BusConfig::from_reader(json.as_bytes());
        assert!(matches!(res, Err(ConfigError::DuplicatePin(17))));
    }

    #[test]
    fn zero_timeout_is_rejected()
    {
        let res = BusConfig::from_reader(r#"{ "bus_timeout_ms": 0 }"#.as_bytes());
        assert!(matches!(res, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error()
    {
        let res = BusConfig::from_reader("{ nope".as_bytes());
        assert!(matches!(res, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults()
    {
        let mut chm = ChannelManager::new();
        let tracer = TraceHelper::new("CFG".to_string(), &mut chm);
        let cfg = load_or_default("/nonexistent/railbus.json", &tracer).unwrap();
        assert_eq!(BusConfig::default(), cfg);
    }
}
