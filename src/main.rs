use std::env;
use std::fs;
use std::path::PathBuf;

use price_history::aggregate::Aggregator;
use price_history::chart;
use price_history::config::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    // Config path from the command line, defaults otherwise.
    let config = match env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    println!("Loading data from: {}", config.data_dir);

    let mut files: Vec<PathBuf> = fs::read_dir(&config.data_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    files.sort();

    let mut aggregator = Aggregator::new();
    for file in &files {
        aggregator.ingest_file(file)?;
    }
    let aggregation = aggregator.finish()?;

    println!(
        "\nAggregated {} valid transactions across {} communities",
        aggregation.extent.valid_records(),
        aggregation.communities.len()
    );
    println!(
        "Month range: {} .. {}",
        aggregation.extent.min_month, aggregation.extent.max_month
    );
    println!(
        "Unit price range: {:.2} .. {:.2}",
        aggregation.extent.min_unit_price, aggregation.extent.max_unit_price
    );

    fs::create_dir_all(&config.result_dir)?;
    let monthly = chart::monthly_chart(&aggregation, &config);
    let points = chart::raw_points_chart(&aggregation, &config);

    let monthly_path = PathBuf::from(&config.result_dir).join("monthly.json");
    fs::write(&monthly_path, serde_json::to_string_pretty(&monthly)?)?;
    let points_path = PathBuf::from(&config.result_dir).join("points.json");
    fs::write(&points_path, serde_json::to_string_pretty(&points)?)?;

    println!(
        "\nWrote chart definitions: {} and {}",
        monthly_path.display(),
        points_path.display()
    );

    Ok(())
}
