mod extract;
mod scrape;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a range of listing pages into a csv file
    Scrape(scrape::ScrapeArgs),
    /// Print the listings found in a saved result page as json
    Extract {
        /// html file of a single result page
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    let args = Cli::parse();
    match args.command {
        Commands::Scrape(scrape_args) => scrape::scrape(scrape_args).await,
        Commands::Extract { file } => extract::extract(file).await,
    }
}
