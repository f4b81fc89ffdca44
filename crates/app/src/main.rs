mod booth;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    booth::telemetry::init_tracing();
    let args: Vec<String> = std::env::args().collect();
    let config = booth::BoothConfig::from_args(&args)?;
    booth::run(config)
}
