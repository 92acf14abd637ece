use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

#[derive(Clone)]
pub struct Configuration {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub api_listen: SocketAddr,
    pub public_url: Url,
    pub log_file: Option<PathBuf>,
    pub reset: bool,
}
