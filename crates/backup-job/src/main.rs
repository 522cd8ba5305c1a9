//! # backup-job
//! Run one scheduled database backup. Run with `init` to write a default config.
//!

use std::{fs, path::PathBuf};

use backup_job::{BackupJob, Config};
use mimalloc::MiMalloc;
use shared::{Failure, init_logger};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let _logger = init_logger().or_log_and_panic("Could not initialize logger");

    // Initialize config if args include 'init'.
    if std::env::args().any(|arg| arg.eq("init")) {
        let config = Config::default();
        let contents =
            toml::to_string_pretty(&config).or_log_and_panic("Could not serialize config file");
        fs::write("config.toml", contents).or_log_and_panic("Could not create config file");
        return;
    }

    // Load config
    let config =
        Config::load_toml(PathBuf::from("./config.toml")).or_log_and_panic("Could not load config");

    let job = BackupJob::new(config).or_log_and_panic("Could not create backup job");

    // The outcome is already logged.
    let _ = job.run().await;
}
