use std::{env, error::Error};

use fitreg_client::Client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let url = env::var("FITREG_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "all_profiles.csv".to_owned());

    let client = fitreg_client::create(url);
    let csv = client.export_csv().await?;
    tokio::fs::write(&path, &csv).await?;
    println!("Wrote {} bytes to {}", csv.len(), path);

    Ok(())
}
