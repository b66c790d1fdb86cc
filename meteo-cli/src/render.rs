use meteo_core::{DisplayResult, ResolutionState};

pub const LOADING: &str = "Chargement...";

/// Plain-text rendering of the visible state; `Idle` renders nothing.
pub fn render_state(state: &ResolutionState) -> String {
    match state {
        ResolutionState::Idle => String::new(),
        ResolutionState::Loading => LOADING.to_string(),
        ResolutionState::Failed(failure) => failure.message.clone(),
        ResolutionState::Success(result) => render_result(result),
    }
}

fn render_result(result: &DisplayResult) -> String {
    format!(
        "{city}\n\n  {headline}°C\n\n  Vent: {wind} km/h\n  Température: {temp} °C\n  Ciel: {description}",
        city = result.city,
        headline = result.headline_temperature,
        wind = result.wind_speed_kmh,
        temp = result.temperature_c,
        description = result.description,
    )
}
