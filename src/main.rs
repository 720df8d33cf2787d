//! Headless entry point.
//!
//! Default mode runs the scheduler daemon; `sheetminder once` executes a
//! single pipeline pass immediately and exits. Both read the same config
//! file and there are no other flags.

use std::env;
use std::process::ExitCode;

use sheetminder::config;
use sheetminder::mailer::SmtpMailer;
use sheetminder::run_log::CsvRunLog;
use sheetminder::runner;
use sheetminder::scheduler::{self, Scheduler};
use sheetminder::sheet::WorkbookSource;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match env::args().nth(1).as_deref() {
        Some("once") => {
            let source = match WorkbookSource::from_config(&config) {
                Ok(source) => source,
                Err(e) => {
                    log::error!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            let mailer = SmtpMailer::new(config.smtp.clone());
            let run_log = CsvRunLog::for_config(&config);

            match runner::run_digest(&config, &source, &mailer, &run_log) {
                Ok(outcome) => {
                    log::info!(
                        "Run complete: {} due today, {} upcoming, email sent: {}",
                        outcome.stats.today_tasks,
                        outcome.stats.advance_tasks,
                        outcome.email_sent
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!("Run failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Some(other) => {
            log::error!("Unknown argument {:?}; usage: sheetminder [once]", other);
            ExitCode::from(2)
        }
        None => {
            if let Ok(tz) = config.source_timezone() {
                if let Ok(next) = scheduler::next_run_time(config.reminder_hour, tz) {
                    log::info!("Next reminder run at {}", next);
                }
            }
            let scheduler = Scheduler::new(config);
            match scheduler.run().await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("Scheduler stopped: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
