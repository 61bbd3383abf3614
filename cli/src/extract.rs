use std::path::PathBuf;
use std::process::ExitCode;

use listing_scraper::boss::extractor;

pub async fn extract(file: PathBuf) -> ExitCode {
    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Failed to read {}: {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let body = String::from_utf8_lossy(&bytes);
    let records = extractor::extract(&body);
    log::info!("Found {} listings in {}", records.len(), file.display());
    match serde_json::to_string_pretty(&records) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to serialize listings: {}", e);
            ExitCode::FAILURE
        }
    }
}
