use clap::Parser;
use hydra::core::config::{self, CliOverrides};
use hydra::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hydra", about = "Terminal front-end for a directory of posts")]
struct Args {
    /// Directory holding the posts
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Editor program, overrides config and $EDITOR
    #[arg(short, long)]
    editor: Option<String>,

    /// Config file to use instead of ~/.config/hydra.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let cli = CliOverrides {
        content_dir: args.dir,
        editor: args.editor,
        log_level: args.log_level,
    };
    let resolved = config::resolve(&file_config, &cli);

    // File logger: the terminal belongs to the UI
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!("Hydra starting up in {}", resolved.content_dir.display());

    if let Err(e) = tui::run(resolved) {
        if let Err(restore) = tui::restore_terminal() {
            log::warn!("Failed to restore terminal: {}", restore);
        }
        log::error!("Exiting: {}", e);
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
