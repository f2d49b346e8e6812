mod cli;
mod house;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--stress") => cli::run_budget_stress(),
        Some("--walk") | None => cli::run_walkthrough(),
        Some(other) => {
            log::error!("Unknown mode '{}', expected --walk or --stress", other);
            Ok(())
        }
    }
}
