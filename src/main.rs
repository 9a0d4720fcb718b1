mod app;
mod cli;
mod core;
mod logging;
mod widgets;

use anyhow::Context;
use tracing::info;

use app::App;
use cli::{parse_args, SamplerKind};
use crate::core::process::ForkSpawner;
use crate::core::registry::ProcessRegistry;
use crate::core::usage::{SysinfoUsageSource, TopUsageSource, UsageSource};

fn main() -> anyhow::Result<()> {
    let config = parse_args();
    logging::init_tracing(&config.log_file)?;

    let parent_pid = std::process::id();
    info!(pid = parent_pid, slots = config.slots, sampler = ?config.sampler, "starting");

    let usage_source: Box<dyn UsageSource> = match config.sampler {
        SamplerKind::Top => Box::new(TopUsageSource::new()),
        SamplerKind::Sysinfo => Box::new(SysinfoUsageSource::new()),
    };
    let registry = ProcessRegistry::new(config.slots, parent_pid, Box::new(ForkSpawner::new()));

    let mut terminal = ratatui::init();

    let app_result = App::new(registry, usage_source).run(&mut terminal);

    ratatui::restore();

    // Spawned processes are left as they are.
    app_result.context("terminal UI failed")?;

    Ok(())
}
