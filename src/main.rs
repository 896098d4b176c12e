use anyhow::Result;
use clap::Parser;
use wxr_core::{AppError, Config};
use wxr_services::{build_shared_data, SharedDataHandle, SharedDataObserver};
use wxr_weather::{DisplayRow, Place};

/// Current weather for a place
#[derive(Parser, Debug)]
#[command(name = "wxreport", version, about)]
struct Cli {
    /// Look up a place by name or address
    #[arg(long, conflicts_with = "current")]
    place: Option<String>,

    /// Use the current location
    #[arg(long)]
    current: bool,

    /// Exit after the first weather update
    #[arg(long)]
    once: bool,

    /// Serve canned conditions instead of calling the weather API
    #[arg(long)]
    canned: bool,
}

/// Prints updates to the terminal
struct ConsoleObserver {
    handle: SharedDataHandle,
    once: bool,
}

impl SharedDataObserver for ConsoleObserver {
    fn on_place_changed(&mut self, place: Option<&Place>) {
        match place {
            Some(place) => println!("\n{}\n{}", place.short_name(), place.one_line_address()),
            None => println!("\n(no place)"),
        }
    }

    fn on_weather_changed(&mut self, rows: &[DisplayRow]) {
        if rows.is_empty() {
            println!("  (no weather data)");
        }
        for row in rows {
            match &row.symbol {
                Some(symbol) => println!("  {:<14} {}  [{}]", row.label, row.text, symbol),
                None => println!("  {:<14} {}", row.label, row.text),
            }
        }
        if self.once {
            self.handle.shutdown();
        }
    }

    fn on_info(&mut self, message: &str) {
        println!("  {}", message);
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("  error: {}", message);
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{:#}", e);
        match e.downcast_ref::<AppError>() {
            Some(app_error) => eprintln!("{}", app_error.user_message()),
            None => eprintln!("{:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    wxr_core::init()?;

    let (mut config, _validation) = Config::load_validated()?;
    if cli.canned {
        config.weather.use_canned_data = true;
    }

    let mut shared = build_shared_data(&config)?;
    let handle = shared.handle();
    shared.register(Box::new(ConsoleObserver {
        handle: handle.clone(),
        once: cli.once,
    }));

    tracing::info!("WeatherReport started");

    // An explicit request replaces whatever was saved
    if let Some(text) = cli.place.as_deref() {
        shared.set_place_to_search(text);
    } else if cli.current {
        shared.set_place_to_current();
    } else {
        shared.load();
        if shared.place().is_none() {
            println!("No saved place. Use --place <name> or --current.");
            return Ok(());
        }
    }

    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    shared.run().await;
    shared.save();

    tracing::info!("WeatherReport stopped");
    Ok(())
}
