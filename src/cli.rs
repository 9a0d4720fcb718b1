use std::path::PathBuf;

use clap::{value_parser, Arg, ArgMatches, Command};

pub const DEFAULT_SLOTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    Top,
    Sysinfo,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub slots: usize,
    pub sampler: SamplerKind,
    pub log_file: PathBuf,
}

pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("proctree.log")
}

fn command() -> Command {
    Command::new("proctree")
        .version("0.1.0")
        .about("Spawn, inspect and terminate a small tree of child processes")
        .arg(
            Arg::new("slots")
                .short('n')
                .long("slots")
                .help("Number of main child slots")
                .value_name("N")
                .value_parser(value_parser!(u8).range(1..=9))
                .default_value("5")
        )
        .arg(
            Arg::new("sampler")
                .short('s')
                .long("sampler")
                .help("Where CPU and memory usage comes from")
                .value_name("SOURCE")
                .value_parser(["top", "sysinfo"])
                .default_value("top")
        )
        .arg(
            Arg::new("log-file")
                .short('l')
                .long("log-file")
                .help("Diagnostics log file (defaults to proctree.log in the temp dir)")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
        )
}

fn config_from_matches(matches: &ArgMatches) -> Config {
    let slots = matches
        .get_one::<u8>("slots")
        .map(|n| *n as usize)
        .unwrap_or(DEFAULT_SLOTS);

    let sampler = match matches.get_one::<String>("sampler").map(String::as_str) {
        Some("sysinfo") => SamplerKind::Sysinfo,
        _ => SamplerKind::Top,
    };

    let log_file = matches
        .get_one::<PathBuf>("log-file")
        .cloned()
        .unwrap_or_else(default_log_file);

    Config {
        slots,
        sampler,
        log_file,
    }
}

pub fn parse_args() -> Config {
    config_from_matches(&command().get_matches())
}
