//! tmdbc - TMDB metadata lookup CLI.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};
use tmdbc_api::{LocalTmdbApi, Scheme, SearchMovieParams, SearchTvParams, TmdbClient};

/// Environment variable that overrides the configured API key.
const API_KEY_ENV: &str = "TMDB_API_KEY";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Write the config file.
    Init(InitArgs),
    /// TMDB endpoint subcommands.
    #[command(flatten)]
    Api(ApiCommands),
}

/// One subcommand per TMDB endpoint.
#[derive(Subcommand)]
enum ApiCommands {
    /// Get movie details (falls back when the title is empty).
    Movie(IdLangArgs),
    /// Get changes for one movie, or all recent movie changes.
    MovieChanges(ChangesArgs),
    /// Get movie cast and crew.
    MovieCredits(IdArgs),
    /// Get all upcoming movies.
    MovieUpcoming,
    /// Get movie videos.
    MovieVideos(IdLangArgs),
    /// Get person details (falls back when the name is empty).
    Person(IdLangArgs),
    /// Get changes for one person, or all recent person changes.
    PersonChanges(ChangesArgs),
    /// Get TV series details (falls back when the overview is empty).
    Tv(IdLangArgs),
    /// Get changes for one TV series, or all recent TV changes.
    TvChanges(ChangesArgs),
    /// Get the TVDB id of a TV series.
    TvExternalIds(IdArgs),
    /// Get TV series videos.
    TvVideos(IdLangArgs),
    /// Get season details (falls back when the overview is empty).
    Season(SeasonArgs),
    /// Get changes for a season by TMDB season id.
    SeasonChanges(IdArgs),
    /// Get season cast and crew.
    SeasonCredits(SeasonArgs),
    /// Get episode details with the localized-name merge.
    Episode(EpisodeArgs),
    /// Get episode cast and crew.
    EpisodeCredits(EpisodeArgs),
    /// Find TMDB objects by external id.
    Find(FindArgs),
    /// Search for movies.
    SearchMovie(SearchMovieArgs),
    /// Search for TV series.
    SearchTv(SearchTvArgs),
    /// Get the merged genre list.
    Genres,
}

/// URL scheme accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl From<SchemeArg> for Scheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Http => Self::Http,
            SchemeArg::Https => Self::Https,
        }
    }
}

/// Arguments for the `init` subcommand.
#[derive(clap::Args)]
struct InitArgs {
    /// TMDB API key.
    #[arg(long, required = true)]
    api_key: String,
    /// Default response language.
    #[arg(long, default_value = "de")]
    default_language: String,
    /// Fallback language.
    #[arg(long, default_value = "en")]
    fallback_language: String,
    /// URL scheme.
    #[arg(long, value_enum, default_value = "http")]
    scheme: SchemeArg,
}

/// Arguments for endpoints taking a single id.
#[derive(clap::Args)]
struct IdArgs {
    /// TMDB id.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for endpoints taking an id and an optional language.
#[derive(clap::Args)]
struct IdLangArgs {
    /// TMDB id.
    #[arg(long, required = true)]
    id: u64,
    /// Response language (default: configured default language).
    #[arg(long)]
    language: Option<String>,
}

/// Arguments for the `*-changes` subcommands.
#[derive(clap::Args)]
struct ChangesArgs {
    /// TMDB id. Fetches every page of the global change list if omitted.
    #[arg(long)]
    id: Option<u64>,
}

/// Arguments for season endpoints.
#[derive(clap::Args)]
struct SeasonArgs {
    /// TMDB series ID.
    #[arg(long, required = true)]
    id: u64,
    /// Season number.
    #[arg(long, required = true)]
    season: u32,
}

/// Arguments for episode endpoints.
#[derive(clap::Args)]
struct EpisodeArgs {
    /// TMDB series ID.
    #[arg(long, required = true)]
    id: u64,
    /// Season number.
    #[arg(long, required = true)]
    season: u32,
    /// Episode number.
    #[arg(long, required = true)]
    episode: u32,
}

/// Arguments for the `find` subcommand.
#[derive(clap::Args)]
struct FindArgs {
    /// External id (e.g. "tt0133093").
    #[arg(long, required = true)]
    id: String,
    /// External source (e.g. "imdb_id", "tvdb_id").
    #[arg(long)]
    source: Option<String>,
}

/// Arguments for the `search-movie` subcommand.
#[derive(clap::Args)]
struct SearchMovieArgs {
    /// Search query (e.g. "Lola rennt").
    #[arg(long, required = true)]
    query: String,
    /// Result page.
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Include adult titles.
    #[arg(long)]
    include_adult: bool,
    /// Filter by year.
    #[arg(long)]
    year: Option<u32>,
}

/// Arguments for the `search-tv` subcommand.
#[derive(clap::Args)]
struct SearchTvArgs {
    /// Search query (e.g. "Babylon Berlin").
    #[arg(long, required = true)]
    query: String,
    /// Result page.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Runs the `init` subcommand.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or written.
#[instrument(skip_all)]
fn run_init(args: &InitArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let mut config = AppConfig::load(&config_path).context("failed to load config")?;
    config.tmdb.api_key = Some(args.api_key.clone());
    config.tmdb.default_language.clone_from(&args.default_language);
    config.tmdb.fallback_language.clone_from(&args.fallback_language);
    config.tmdb.scheme = args.scheme.into();
    config.save(&config_path).context("failed to save config")?;

    tracing::info!("Saved config to {}", config_path.display());
    Ok(())
}

/// Builds a `TmdbClient` from the config file and environment.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, no API key is
/// configured, or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(dir: Option<&PathBuf>) -> Result<TmdbClient> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;

    let api_key = config
        .tmdb
        .resolve_api_key(std::env::var(API_KEY_ENV).ok())
        .with_context(|| {
            format!("TMDB api_key is not configured (set {API_KEY_ENV} or [tmdb].api_key)")
        })?;

    TmdbClient::builder()
        .api_key(api_key)
        .scheme(config.tmdb.scheme)
        .default_language(config.tmdb.default_language)
        .fallback_language(config.tmdb.fallback_language)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build TMDB client")
}

/// Runs one API subcommand and logs the JSON result.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_api(command: ApiCommands, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_tmdb_client(dir)?;

    let result = match command {
        ApiCommands::Movie(args) => client.get_movie(args.id, args.language.as_deref()).await,
        ApiCommands::MovieChanges(args) => client.get_movie_changes(args.id).await,
        ApiCommands::MovieCredits(args) => client.get_movie_credits(args.id).await,
        ApiCommands::MovieUpcoming => client.get_movie_upcoming().await,
        ApiCommands::MovieVideos(args) => {
            client
                .get_movie_videos(args.id, args.language.as_deref())
                .await
        }
        ApiCommands::Person(args) => client.get_person(args.id, args.language.as_deref()).await,
        ApiCommands::PersonChanges(args) => client.get_person_changes(args.id).await,
        ApiCommands::Tv(args) => client.get_tv(args.id, args.language.as_deref()).await,
        ApiCommands::TvChanges(args) => client.get_tv_changes(args.id).await,
        ApiCommands::TvExternalIds(args) => client.get_tv_external_ids(args.id).await,
        ApiCommands::TvVideos(args) => client.get_tv_videos(args.id, args.language.as_deref()).await,
        ApiCommands::Season(args) => client.get_season(args.id, args.season).await,
        ApiCommands::SeasonChanges(args) => client.get_season_changes(args.id).await,
        ApiCommands::SeasonCredits(args) => client.get_season_credits(args.id, args.season).await,
        ApiCommands::Episode(args) => {
            client
                .get_episode(args.id, args.season, args.episode)
                .await
        }
        ApiCommands::EpisodeCredits(args) => {
            client
                .get_episode_credits(args.id, args.season, args.episode)
                .await
        }
        ApiCommands::Find(args) => client.find(&args.id, args.source.as_deref()).await,
        ApiCommands::SearchMovie(args) => {
            let mut params = SearchMovieParams::new(args.query)
                .page(args.page)
                .include_adult(args.include_adult);
            if let Some(year) = args.year {
                params = params.year(year);
            }
            client.search_movie(&params).await
        }
        ApiCommands::SearchTv(args) => {
            let params = SearchTvParams::new(args.query).page(args.page);
            client.search_tv(&params).await
        }
        ApiCommands::Genres => client.get_genres().await,
    };

    let value = result.context("TMDB request failed")?;
    print_json(&value)
}

/// Logs a JSON value in pretty form.
///
/// # Errors
///
/// Returns an error if serialization fails.
fn print_json(value: &Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    tracing::info!("{pretty}");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => run_init(&args, cli.dir.as_ref()),
        Commands::Api(command) => run_api(command, cli.dir.as_ref()).await,
    }
}
