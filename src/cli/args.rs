use clap::Parser;
use std::env;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Register and discover recycling collection points over a REST API",
    long_about = "Ecoleta server: a JSON REST API over SQLite for registering recycling \
collection points and browsing them by city, state and accepted materials."
)]
pub struct Cli {
    #[arg(
        long,
        env = "ECOLETA_DATA_DIR",
        default_value = ".ecoleta/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "uploads-dir",
        env = "ECOLETA_UPLOADS_DIR",
        value_name = "DIR",
        help = "Directory for uploaded point images [default: <data-dir>/uploads]"
    )]
    pub uploads_dir: Option<String>,

    #[arg(
        long = "api-listen",
        env = "ECOLETA_API_LISTEN",
        default_value = "127.0.0.1:3333",
        value_name = "ADDR",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "public-url",
        env = "ECOLETA_PUBLIC_URL",
        default_value = "http://127.0.0.1:3333",
        value_name = "URL",
        help = "Public base URL the static file server exposes uploads under; used to build image links"
    )]
    pub public_url: url::Url,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long = "log-file",
        env = "ECOLETA_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}
