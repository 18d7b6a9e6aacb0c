use clap::Parser;
use profile_harvest::{Harvester, ProfileRecord};
use profile_harvest::utils::sanitize_filename;
use std::path::Path;

mod args;
use args::{Args, convert_source};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let source = match convert_source(&args) {
        Ok(source) => source,
        Err(e) => {
            ::log::error!("{}", e);
            return;
        }
    };

    println!("Note: Harvesting requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    let mut harvester = Harvester::new(source);
    if let Some(path) = &args.config {
        harvester = match harvester.with_config_file(path) {
            Ok(harvester) => harvester,
            Err(e) => {
                ::log::error!("Failed to load configuration: {}", e);
                return;
            }
        };
    }

    // Credentials are only used when no persisted session is still valid.
    if let (Ok(username), Ok(password)) = (
        std::env::var("LINKEDIN_USERNAME"),
        std::env::var("LINKEDIN_PASSWORD"),
    ) {
        harvester = harvester.with_credentials(&username, &password);
    }

    if args.links_only {
        match harvester.discover().await {
            Ok(links) => {
                for link in links {
                    println!("{}", link);
                }
            }
            Err(e) => ::log::error!("Discovery failed: {}", e),
        }
        return;
    }

    if let Err(e) = std::fs::create_dir_all(&args.out_dir) {
        ::log::error!("Failed to create output directory: {}", e);
        return;
    }

    // Start the harvest and get a receiver for records
    let mut rx = match harvester.run().await {
        Ok(rx) => rx,
        Err(e) => {
            ::log::error!("Failed to start harvest: {}", e);
            return;
        }
    };

    // Process records as they come in
    let mut records_written = 0;
    let start_time = std::time::Instant::now();

    while let Some(record) = rx.recv().await {
        records_written += 1;
        write_record(&args.out_dir, &record, records_written);
    }

    let duration = start_time.elapsed();
    ::log::info!(
        "Harvest complete - wrote {} records in {:.2} seconds",
        records_written,
        duration.as_secs_f64()
    );
}

/// Write one record to the output directory, named after its profile URL.
fn write_record(out_dir: &Path, record: &ProfileRecord, count: i32) {
    let path = out_dir.join(format!("{}.json", sanitize_filename(&record.url)));
    match serde_json::to_string_pretty(record) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                ::log::error!("Failed to write {}: {}", path.display(), e);
            } else {
                ::log::info!("Wrote record {}: {}", count, path.display());
            }
        }
        Err(e) => ::log::error!("Failed to serialize record for {}: {}", record.url, e),
    }
}
