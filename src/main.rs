use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::info;

use vocab_reader::config::Config;
use vocab_reader::library::Library;
use vocab_reader::state::{ReaderState, Route};
use vocab_reader::subtitles::{parse_with_options, SubtitleStrategy, SubtitleTrack};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Vocab Reader")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Render chapters with vocabulary tooltips, frequency sizing and subtitle spans")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to vocab-reader.toml)")
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Directory containing chapters.json and chapter files")
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Load chapter data over HTTP from this URL")
        )
        .arg(
            Arg::new("chapter")
                .long("chapter")
                .value_name("ID")
                .help("Chapter to render; the table of contents when omitted")
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write HTML here instead of stdout")
        )
        .arg(
            Arg::new("subtitles")
                .long("subtitles")
                .value_name("FILE")
                .help("Subtitle track for the rendered chapter")
                .requires("chapter")
        )
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .value_name("STRATEGY")
                .help("Subtitle placement strategy")
                .value_parser(["align", "fuzzy"])
        )
        .arg(
            Arg::new("fragment")
                .long("fragment")
                .help("Emit the page fragment without the HTML document wrapper")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .help("Start the HTTP server (requires the api feature)")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16))
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::load().unwrap_or_default(),
    };

    if matches.get_flag("verbose") {
        config.output.log_level = "debug".to_string();
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(format!("vocab_reader={},warn", config.output.log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.data.data_dir = PathBuf::from(data_dir);
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.data.base_url = Some(base_url.clone());
    }
    if let Some(strategy) = matches.get_one::<String>("strategy") {
        config.subtitles.strategy = match strategy.as_str() {
            "fuzzy" => SubtitleStrategy::Fuzzy,
            _ => SubtitleStrategy::Align,
        };
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    config.validate()?;
    info!("🚀 Vocab Reader starting...");
    info!("{}", config.summary());

    let library = Library::from_config(&config.data)?;

    if matches.get_flag("serve") {
        return serve(library, config).await;
    }

    let mut state = ReaderState::load(&library, &config).await;

    let route = match matches.get_one::<String>("chapter") {
        Some(id) => Route::Chapter(id.clone()),
        None => Route::Toc,
    };

    if let (Some(path), Route::Chapter(id)) = (matches.get_one::<String>("subtitles"), &route) {
        let raw = tokio::fs::read_to_string(path).await?;
        let track = SubtitleTrack::new(parse_with_options(&raw, &config.subtitles.parse_options())?);
        info!("🎬 Loaded {} subtitles from {}", track.len(), path);
        state.set_subtitles(id, track);
    }

    let html = if matches.get_flag("fragment") {
        state.render_route(&route)?
    } else {
        state.render_document(&route)?
    };

    match matches.get_one::<String>("output") {
        Some(path) => {
            tokio::fs::write(path, &html).await?;
            info!("💾 Wrote {} bytes to {}", html.len(), path);
        }
        None => println!("{}", html),
    }

    Ok(())
}

#[cfg(feature = "api")]
async fn serve(library: Library, config: Config) -> Result<()> {
    let server = vocab_reader::api::ApiServer::new(library, std::sync::Arc::new(config)).await;
    server.start().await
}

#[cfg(not(feature = "api"))]
async fn serve(_library: Library, _config: Config) -> Result<()> {
    tracing::warn!("--serve needs a build with the api feature");
    Err(anyhow::anyhow!("HTTP server not available in this build"))
}
