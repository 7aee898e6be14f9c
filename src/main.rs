use brrtbench::cli::{run_cli, Cli};
use brrtbench::logging::init_logging_with_config;
use brrtbench::memory::CountingAllocator;
use clap::Parser;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: CountingAllocator<tikv_jemallocator::Jemalloc> =
    CountingAllocator::new(tikv_jemallocator::Jemalloc);

#[cfg(not(feature = "jemalloc"))]
#[global_allocator]
static GLOBAL: CountingAllocator<std::alloc::System> = CountingAllocator::new(std::alloc::System);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&cli.log_config())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_cli(cli, &mut out)
}
