use clap::Parser;
use valform::{EditorConfig, config::Cli};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EditorConfig::from(Cli::parse());
    log::info!(
        "editing {:?} against schema {:?}",
        config.values_path,
        config.schema_path
    );
    valform::run_gui(config).map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
