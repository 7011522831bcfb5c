use std::env;

use finance_api::{run_server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up OLLAMA_* and path overrides from a local .env, if any.
    dotenvy::dotenv().ok();

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "5000".to_string())
        .parse()
        .unwrap_or(5000);

    let state = AppState::from_env();

    println!("Finance Analyzer API Server");
    println!("===========================");
    println!("Upload dir:  {}", state.upload_dir.display());
    println!("Sample data: {}", state.sample_data.display());
    println!("Listening on: {}:{}", host, port);
    println!();

    if !state.sample_data.exists() {
        eprintln!(
            "[WARN] sample dataset not found at: {}",
            state.sample_data.display()
        );
        eprintln!("       Continuing; /api/sample will fail until the file exists.");
    }

    run_server(state, &host, port).await?;

    Ok(())
}
