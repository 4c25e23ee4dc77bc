use std::fmt::Display;
use std::fs::OpenOptions;

use simplelog::{ColorChoice, LevelFilter, TerminalMode, TermLogger, WriteLogger};

use crate::config::LogConfig;
use crate::utils::{ErrorStr, ResultV};


const LOGGER_ERROR: &str = "logger init error";


/// Logs the cause of a failure with its module and scope, then hands back a
/// fixed error message.
pub struct Reporter {
    module: &'static str,
    scope: &'static str,
    error: ErrorStr,
}

impl Reporter {
    pub fn report(&self, e: impl Display) -> ErrorStr {
        error!("[{}] {} error: {}", self.module, self.scope, e);
        self.error
    }
}

pub fn get_reporter(module: &'static str, scope: &'static str, error: ErrorStr) -> Reporter {
    Reporter { module, scope, error }
}


pub fn init_logger(cfg: &LogConfig) -> ResultV {
    let level = cfg.level_filter();
    match cfg.kind.as_str() {
        "console" => init_term_logger(level),
        "file"    => init_file_logger(level, &cfg.file),
        _         => {
            eprintln!(
                "Unsupported log type: {}, only `file` and `console` are supported. Use `console` by default",
                cfg.kind
            );
            init_term_logger(level)
        }
    }
}


fn prepare_logger_config() -> simplelog::Config {
    let mut builder = simplelog::ConfigBuilder::new();
    builder.set_time_format_custom(
        simplelog::format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        )
    );
    // stays on UTC when the local offset cannot be determined
    match builder.set_time_offset_to_local() {
        Ok(b) | Err(b) => b.build(),
    }
}

fn init_term_logger(level: LevelFilter) -> ResultV {
    TermLogger::init(
        level,
        prepare_logger_config(),
        TerminalMode::Stderr, ColorChoice::Auto
    ).map_err(|e| {
        eprintln!("Could not initialize console logger: {}", e);
        LOGGER_ERROR
    })
}

fn init_file_logger(level: LevelFilter, filename: &str) -> ResultV {
    let file = OpenOptions::new().write(true).create(true).append(true).open(filename).map_err(|e| {
        eprintln!("Could not open log file {}: {}", filename, e);
        LOGGER_ERROR
    })?;
    WriteLogger::init(level, prepare_logger_config(), file).map_err(|e| {
        eprintln!("Could not initialize file logger: {}", e);
        LOGGER_ERROR
    })
}
