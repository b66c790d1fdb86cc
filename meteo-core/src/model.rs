use serde::{Deserialize, Serialize};

/// Place name entered by the user, already trimmed and known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// First geocoding candidate for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// "Paris, France", or just the name when the provider gave no country.
    pub fn label(&self) -> String {
        match self.country.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

/// Current conditions at a coordinate pair, valid at fetch time only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
}

/// Coarse sky condition derived from a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkyBucket {
    Clear,
    Cloudy,
    Rain,
}

impl SkyBucket {
    /// Codes 0..=2 are clear to partly cloudy.
    pub const CLEAR_BELOW: i32 = 3;
    /// Overcast and fog sit below the drizzle range (51+).
    pub const CLOUDY_BELOW: i32 = 50;

    pub fn from_code(code: i32) -> Self {
        if code < Self::CLEAR_BELOW {
            Self::Clear
        } else if code < Self::CLOUDY_BELOW {
            Self::Cloudy
        } else {
            Self::Rain
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkyBucket::Clear => "Ensoleillé",
            SkyBucket::Cloudy => "Nuageux",
            SkyBucket::Rain => "Pluie",
        }
    }
}

/// How the weather code is presented in a [`DisplayResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionStyle {
    #[default]
    Bucketed,
    Code,
}

impl DescriptionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionStyle::Bucketed => "bucketed",
            DescriptionStyle::Code => "code",
        }
    }

    pub const fn all() -> &'static [DescriptionStyle] {
        &[DescriptionStyle::Bucketed, DescriptionStyle::Code]
    }
}

impl std::fmt::Display for DescriptionStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DescriptionStyle {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "bucketed" => Ok(DescriptionStyle::Bucketed),
            "code" => Ok(DescriptionStyle::Code),
            _ => Err(anyhow::anyhow!(
                "Unknown description style '{value}'. Supported styles: bucketed, code."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Description {
    Sky(SkyBucket),
    Code(i32),
}

impl std::fmt::Display for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Description::Sky(bucket) => f.write_str(bucket.label()),
            Description::Code(code) => write!(f, "Code {code}"),
        }
    }
}

/// Everything a renderer needs for one successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayResult {
    pub city: String,
    pub temperature_c: f64,
    pub headline_temperature: i64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
    pub description: Description,
}

impl DisplayResult {
    pub fn new(location: &Location, observation: &Observation, style: DescriptionStyle) -> Self {
        let description = match style {
            DescriptionStyle::Bucketed => {
                Description::Sky(SkyBucket::from_code(observation.weather_code))
            }
            DescriptionStyle::Code => Description::Code(observation.weather_code),
        };

        Self {
            city: location.label(),
            temperature_c: observation.temperature_c,
            headline_temperature: headline_temperature(observation.temperature_c),
            wind_speed_kmh: observation.wind_speed_kmh,
            weather_code: observation.weather_code,
            description,
        }
    }
}

/// Rounds half away from zero (21.5 -> 22, -21.5 -> -22).
pub fn headline_temperature(temperature_c: f64) -> i64 {
    temperature_c.round() as i64
}
