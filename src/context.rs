use std::path::PathBuf;

use crate::configuration::Configuration;

pub struct Context {
    pub config: Configuration,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        let data_dir = PathBuf::from(&cli.data_dir);
        let uploads_dir = cli
            .uploads_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("uploads"));

        let cfg = Configuration {
            data_dir,
            uploads_dir,
            api_listen: cli.api_listen,
            public_url: cli.public_url.clone(),
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            reset: cli.reset,
        };
        Self { config: cfg }
    }
}
