use clap::Parser;
use color_eyre::Result;
use kontent_usage_insights::{
    init_errors,
    init_logging,
    App,
};
use usage_insights_config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let args = Args::parse();
    init_logging(args.verbose)?;
    App::new(args)?.run().await
}
