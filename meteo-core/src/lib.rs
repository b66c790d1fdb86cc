//! Core library for the `meteo` city weather lookup.
//!
//! This crate defines:
//! - Configuration handling
//! - Geocoding and current-weather clients behind traits (Open-Meteo by default)
//! - The resolution sequence chaining both lookups into a display-ready result
//!
//! It is used by `meteo-cli`, but can also back other front ends.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod resolution;

pub use config::{Config, Messages};
pub use error::{Failure, FailureKind, LookupError};
pub use model::{
    Description, DescriptionStyle, DisplayResult, Location, Observation, Query, SkyBucket,
};
pub use provider::{Geocoder, WeatherSource, open_meteo_from_config};
pub use resolution::{Outcome, ResolutionState, Resolver, ResolverSettings};
