//! # Serial Configuration
//!
//! Line settings for the UART link. Values are checked when a connection is
//! opened; an invalid combination fails the connect instead of being coerced
//! to a default.
//!
//! ## Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | Baud rate | 115200 |
//! | Data bits | 8 |
//! | Stop bits | 1 |
//! | Parity | none |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity as SpParity, StopBits};

use crate::error::PixelwireError;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_DATA_BITS: u8 = 8;
pub const DEFAULT_STOP_BITS: u8 = 1;

/// Parity setting for serial port configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    #[serde(alias = "None")]
    None,
    #[serde(alias = "Odd")]
    Odd,
    #[serde(alias = "Even")]
    Even,
}

impl FromStr for Parity {
    type Err = PixelwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            other => Err(PixelwireError::Connect(format!(
                "unknown parity '{}' (expected none, odd or even)",
                other
            ))),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::None => write!(f, "none"),
            Parity::Odd => write!(f, "odd"),
            Parity::Even => write!(f, "even"),
        }
    }
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_data_bits() -> u8 {
    DEFAULT_DATA_BITS
}

fn default_stop_bits() -> u8 {
    DEFAULT_STOP_BITS
}

/// Port identifier plus line settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path or name (`/dev/ttyUSB0`, `COM3`)
    pub port: String,
    #[serde(default = "default_baud_rate", alias = "baudrate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: Parity,
}

/// Validated settings in the `serialport` crate's types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: SpParity,
}

impl SerialConfig {
    /// Config for `port` with every line setting at its default.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
            stop_bits: DEFAULT_STOP_BITS,
            parity: Parity::None,
        }
    }

    /// Check every field and convert to `serialport` settings.
    pub fn validate(&self) -> Result<LineSettings, PixelwireError> {
        if self.port.trim().is_empty() {
            return Err(PixelwireError::Connect("port must not be empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(PixelwireError::Connect("baud rate must be positive".to_string()));
        }

        Ok(LineSettings {
            baud_rate: self.baud_rate,
            data_bits: to_serialport_data_bits(self.data_bits)?,
            stop_bits: to_serialport_stop_bits(self.stop_bits)?,
            parity: to_serialport_parity(self.parity),
        })
    }
}

/// Convert our Parity enum to serialport crate's Parity type
pub fn to_serialport_parity(p: Parity) -> SpParity {
    match p {
        Parity::None => SpParity::None,
        Parity::Odd => SpParity::Odd,
        Parity::Even => SpParity::Even,
    }
}

/// Convert data bits count to serialport crate's DataBits type
pub fn to_serialport_data_bits(bits: u8) -> Result<DataBits, PixelwireError> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(PixelwireError::Connect(format!(
            "unsupported data bits {} (expected 5-8)",
            other
        ))),
    }
}

/// Convert stop bits count to serialport crate's StopBits type
pub fn to_serialport_stop_bits(bits: u8) -> Result<StopBits, PixelwireError> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(PixelwireError::Connect(format!(
            "unsupported stop bits {} (expected 1 or 2)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SerialConfig::new("/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, 8);
        assert_eq!(config.stop_bits, 1);
        assert_eq!(config.parity, Parity::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SerialConfig = serde_json::from_str(r#"{"port": "COM3"}"#).unwrap();
        assert_eq!(config, SerialConfig::new("COM3"));

        let config: SerialConfig =
            serde_json::from_str(r#"{"port": "COM3", "baudrate": 9600, "parity": "Even"}"#)
                .unwrap();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.parity, Parity::Even);
    }

    #[test]
    fn test_parity_from_str() {
        assert_eq!("NONE".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!("odd".parse::<Parity>().unwrap(), Parity::Odd);
        assert_eq!("E".parse::<Parity>().unwrap(), Parity::Even);
        assert!("mark".parse::<Parity>().is_err());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut config = SerialConfig::new("COM3");
        config.data_bits = 9;
        assert!(matches!(config.validate(), Err(PixelwireError::Connect(_))));

        let mut config = SerialConfig::new("COM3");
        config.stop_bits = 0;
        assert!(matches!(config.validate(), Err(PixelwireError::Connect(_))));

        let mut config = SerialConfig::new("COM3");
        config.baud_rate = 0;
        assert!(config.validate().is_err());

        assert!(SerialConfig::new("  ").validate().is_err());
    }

    #[test]
    fn test_line_settings_conversion() {
        let mut config = SerialConfig::new("COM3");
        config.data_bits = 7;
        config.stop_bits = 2;
        config.parity = Parity::Odd;
        let settings = config.validate().unwrap();
        assert!(matches!(settings.data_bits, DataBits::Seven));
        assert!(matches!(settings.stop_bits, StopBits::Two));
        assert!(matches!(settings.parity, SpParity::Odd));
    }
}
