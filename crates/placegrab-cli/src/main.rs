use clap::Parser;
use tracing_subscriber::EnvFilter;

mod runner;

#[derive(Debug, Parser)]
#[command(name = "placegrab")]
#[command(about = "Collects place data from search APIs into a CSV report")]
struct Cli {
    /// Directory holding the `*_input.csv` term files and the credentials
    /// file. Overrides `PLACEGRAB_INPUT_DIR`.
    #[arg(long)]
    input_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = placegrab_core::load_app_config()?;
    if let Some(dir) = cli.input_dir {
        config.input_dir = dir;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let report = runner::run_batch(&config).await?;
    println!("report written to {}", report.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_is_a_valid_invocation() {
        let cli = Cli::try_parse_from(["placegrab"]).expect("expected valid cli args");
        assert!(cli.input_dir.is_none());
    }

    #[test]
    fn input_dir_flag_is_parsed() {
        let cli = Cli::try_parse_from(["placegrab", "--input-dir", "/data/runs"])
            .expect("expected valid cli args");
        assert_eq!(
            cli.input_dir,
            Some(std::path::PathBuf::from("/data/runs"))
        );
    }
}
