use std::env;
use std::process::ExitCode;

use tabnav::shell::DemoHost;
use tabnav::shell::driver::TerminalDriver;
use tabnav::{DemoShell, FileSink, LogLevel, Logger, NavigationConfig};

const LOG_ENV: &str = "TABNAV_LOG";
const LOG_MAX_BYTES: u64 = 512 * 1024;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tabnav-demo: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = NavigationConfig::default();
    if let Ok(path) = env::var(LOG_ENV) {
        let logger = Logger::new(FileSink::new(path, LOG_MAX_BYTES)?).with_min_level(LogLevel::Debug);
        config = config.with_logger(logger);
        config.enable_metrics();
    }

    let shell = DemoShell::create(DemoHost::new(), config, None)?;
    TerminalDriver::new(shell).run()?;
    Ok(())
}
