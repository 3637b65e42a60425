use chrono::Local;
use dotenvy::dotenv;
use fern::Dispatch;
use log::{info, LevelFilter};

mod server {
    pub mod web {
        pub mod callback;
    }
}

mod util {
    pub mod errors;
}

mod client {
    pub mod api_proxy;
    pub mod cli {
        pub mod cli_app;
        pub mod formatter;
    }
    pub mod core {
        pub mod pagination;
        pub mod playlist_manager;
        pub mod ranking;
        pub mod search_manager;
    }
}

#[tokio::main]
async fn main() {
    // load environment variables from .env file
    dotenv().ok();

    // initialize logging
    std::fs::create_dir_all("logs").ok();
    let log_file_name = format!("logs/ytpl_{}.log", Local::now().format("%Y%m%d-%H%M%S"));
    let logger = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for("ytpl", LevelFilter::Debug)
        .chain(std::io::stderr())
        .chain(fern::log_file(log_file_name).unwrap())
        .apply();

    if logger.is_err() {
        eprintln!("Failed to initialize logger: {:?}", logger.err());
    }

    info!("Starting program.");

    let api_proxy = client::api_proxy::ApiProxy::new();

    let args = std::env::args().collect::<Vec<String>>();
    client::cli::cli_app::run_cli(&api_proxy, args).await;

    info!("Stopping program.");
}
