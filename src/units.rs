//! Unit systems and the measurement units they imply

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, WeatherError};

/// Measurement convention selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Imperial,
    Metric,
}

impl UnitSystem {
    /// All valid unit systems
    pub const ALL: [UnitSystem; 2] = [UnitSystem::Imperial, UnitSystem::Metric];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = WeatherError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "imperial" => Ok(UnitSystem::Imperial),
            "metric" => Ok(UnitSystem::Metric),
            other => Err(WeatherError::InvalidUnitSystem {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Fahrenheit,
    Celsius,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindSpeedUnit {
    MilesPerHour,
    KilometresPerHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipitationUnit {
    Inch,
    Millimetre,
}

impl TemperatureUnit {
    /// Value of the provider's `temperature_unit` parameter
    #[must_use]
    pub fn query_value(self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Celsius => "celsius",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Celsius => "°C",
        }
    }
}

impl WindSpeedUnit {
    /// Value of the provider's `wind_speed_unit` parameter
    #[must_use]
    pub fn query_value(self) -> &'static str {
        match self {
            WindSpeedUnit::MilesPerHour => "mph",
            WindSpeedUnit::KilometresPerHour => "kmh",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WindSpeedUnit::MilesPerHour => "mph",
            WindSpeedUnit::KilometresPerHour => "km/h",
        }
    }
}

impl PrecipitationUnit {
    /// Value of the provider's `precipitation_unit` parameter
    #[must_use]
    pub fn query_value(self) -> &'static str {
        match self {
            PrecipitationUnit::Inch => "inch",
            PrecipitationUnit::Millimetre => "mm",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PrecipitationUnit::Inch => "in",
            PrecipitationUnit::Millimetre => "mm",
        }
    }
}

/// Concrete units for one unit system.
///
/// Only [`UnitProfile::IMPERIAL`] and [`UnitProfile::METRIC`] exist; the
/// fields are private so no mixed profile can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitProfile {
    system: UnitSystem,
    temperature: TemperatureUnit,
    wind: WindSpeedUnit,
    precipitation: PrecipitationUnit,
}

impl UnitProfile {
    pub const IMPERIAL: UnitProfile = UnitProfile {
        system: UnitSystem::Imperial,
        temperature: TemperatureUnit::Fahrenheit,
        wind: WindSpeedUnit::MilesPerHour,
        precipitation: PrecipitationUnit::Inch,
    };

    pub const METRIC: UnitProfile = UnitProfile {
        system: UnitSystem::Metric,
        temperature: TemperatureUnit::Celsius,
        wind: WindSpeedUnit::KilometresPerHour,
        precipitation: PrecipitationUnit::Millimetre,
    };

    #[must_use]
    pub fn for_system(system: UnitSystem) -> Self {
        match system {
            UnitSystem::Imperial => Self::IMPERIAL,
            UnitSystem::Metric => Self::METRIC,
        }
    }

    #[must_use]
    pub fn system(&self) -> UnitSystem {
        self.system
    }

    #[must_use]
    pub fn temperature(&self) -> TemperatureUnit {
        self.temperature
    }

    #[must_use]
    pub fn wind(&self) -> WindSpeedUnit {
        self.wind
    }

    #[must_use]
    pub fn precipitation(&self) -> PrecipitationUnit {
        self.precipitation
    }
}

/// Resolve a unit system selector into its unit profile.
///
/// # Errors
///
/// Returns [`WeatherError::InvalidUnitSystem`] unless `system` is exactly
/// `imperial` or `metric`.
pub fn resolve(system: &str) -> Result<UnitProfile> {
    system.parse::<UnitSystem>().map(UnitProfile::for_system)
}
