use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::info;
use std::fs;
use treemark::app::TreemarkApp;
use treemark::cli::Cli;
use treemark::config::Config;
use treemark::{MarkError, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    info!("Application started with command: {:?}", cli.command);
    let config = Config::load(cli.config.as_deref())?;
    let app = TreemarkApp::new(config);
    app.run(&cli).await
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir).map_err(MarkError::Io)?;
            }
        }
        let log_file = fs::File::create(log_path).map_err(MarkError::Io)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| MarkError::Other(e.to_string()))?;
    Ok(())
}
