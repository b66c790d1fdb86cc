use std::io::{self, Write};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Select, Text};
use meteo_core::{
    Config, DescriptionStyle, Geocoder, Outcome, ResolutionState, Resolver, ResolverSettings,
    WeatherSource, open_meteo_from_config,
    provider::open_meteo::{OpenMeteoGeocoder, OpenMeteoWeather},
};
use tracing::debug;

use crate::render::render_state;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Current weather for a city")]
pub struct Cli {
    /// Override the configured description style ("bucketed" or "code").
    #[arg(long, global = true)]
    pub style: Option<String>,

    /// Override the configured response-language hint, e.g. "en".
    #[arg(long, global = true)]
    pub language: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a place name.
    Show {
        /// Place name, e.g. "Paris" or "Goma".
        place: String,
    },

    /// Prompt for place names until Esc or Ctrl-C.
    Interactive,

    /// Edit language, description style and timeout interactively.
    Configure,

    /// Print the path of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.effective_config()?;

        match self.command {
            Command::Show { place } => {
                let resolver = build_resolver(&config)?;
                show(&resolver, &place, &mut io::stdout()).await
            }
            Command::Interactive => {
                let resolver = build_resolver(&config)?;
                interactive(&resolver).await
            }
            Command::Configure => configure(),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }

    fn effective_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load()?;

        if let Some(style) = self.style.as_deref() {
            config.description_style = DescriptionStyle::try_from(style)?;
        }
        if let Some(language) = &self.language {
            config.language = Some(language.clone());
        }

        Ok(config)
    }
}

fn build_resolver(
    config: &Config,
) -> anyhow::Result<Resolver<OpenMeteoGeocoder, OpenMeteoWeather>> {
    let (geocoder, weather) = open_meteo_from_config(config)?;
    Ok(Resolver::new(
        geocoder,
        weather,
        ResolverSettings::from_config(config),
    ))
}

async fn show<G: Geocoder, W: WeatherSource>(
    resolver: &Resolver<G, W>,
    place: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let Some(outcome) = resolver.resolve(place).await else {
        debug!("Blank place name, nothing to look up");
        return Ok(());
    };

    match &outcome.state {
        ResolutionState::Failed(failure) => Err(anyhow!("{}", failure.message)),
        state => write_state(out, state),
    }
}

async fn interactive<G: Geocoder, W: WeatherSource>(
    resolver: &Resolver<G, W>,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout();

    loop {
        let input = match Text::new("Ville :")
            .with_placeholder("Ex : Paris, Goma, Kinshasa")
            .prompt()
        {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to read place name"),
        };

        if input.trim().is_empty() {
            debug!("Blank place name skipped");
            continue;
        }

        resolve_and_render(resolver, &input, &mut stdout).await?;
        writeln!(stdout)?;
    }
}

/// Run one attempt and write every state it publishes (Loading, then the
/// terminal state) as it happens.
async fn resolve_and_render<G: Geocoder, W: WeatherSource>(
    resolver: &Resolver<G, W>,
    input: &str,
    out: &mut impl Write,
) -> anyhow::Result<Option<Outcome>> {
    let mut rx = resolver.subscribe();
    rx.borrow_and_update();

    let resolve = resolver.resolve(input);
    tokio::pin!(resolve);

    loop {
        tokio::select! {
            biased;
            outcome = &mut resolve => {
                if rx.has_changed().unwrap_or(false) {
                    let state = rx.borrow_and_update().clone();
                    write_state(out, &state)?;
                }
                return Ok(outcome);
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(resolve.await);
                }
                let state = rx.borrow_and_update().clone();
                write_state(out, &state)?;
            }
        }
    }
}

fn write_state(out: &mut impl Write, state: &ResolutionState) -> anyhow::Result<()> {
    let rendered = render_state(state);
    if !rendered.is_empty() {
        writeln!(out, "{rendered}")?;
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let language = Text::new("Response language hint (empty for none):")
        .with_default(config.language.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read language")?;
    config.language = Some(language.trim().to_string());

    let styles = DescriptionStyle::all().to_vec();
    let start = styles
        .iter()
        .position(|s| *s == config.description_style)
        .unwrap_or(0);
    config.description_style = Select::new("Description style:", styles)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read description style")?;

    config.request_timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.request_timeout_secs)
        .with_validator(|secs: &u64| {
            if *secs > 0 {
                Ok(inquire::validator::Validation::Valid)
            } else {
                Ok(inquire::validator::Validation::Invalid(
                    "Timeout must be greater than 0".into(),
                ))
            }
        })
        .prompt()
        .context("Failed to read timeout")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
