use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::{json, Value};

use alert_router::resilience::backoff::retry_delay;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Command-line client for the alert router", long_about = None)]
struct Cli {
    /// Public API base URL
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API base URL
    #[arg(long, default_value = "http://localhost:8081")]
    admin_url: String,

    /// Admin API key
    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    /// Identity sent as X-Caller-Id
    #[arg(short, long, default_value = "cli")]
    caller: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the caller's location (degrees × 10^7)
    Register {
        #[arg(allow_hyphen_values = true)]
        lat: i64,
        #[arg(allow_hyphen_values = true)]
        long: i64,
    },
    /// Verify a responder (registry authority only)
    Verify { responder: String },
    /// Transfer the registry authority
    SetAuthority { new_authority: String },
    /// Route an alert, retrying with a widened radius on `no_responders`
    Route {
        alert_id: String,
        #[arg(allow_hyphen_values = true)]
        lat: i64,
        #[arg(allow_hyphen_values = true)]
        long: i64,
        /// Radius in meters for the first attempt; 0 uses the stored or default radius
        #[arg(long, default_value_t = 0)]
        radius: i64,
        /// Extra attempts after a `no_responders` result
        #[arg(long, default_value_t = 0)]
        retries: u32,
        #[arg(long, default_value_t = 500)]
        backoff_ms: u64,
    },
    /// Show an alert's routing record
    Get { alert_id: String },
    /// Clear an alert's routing record
    Reset { alert_id: String },
    /// Show router status (admin API)
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert("x-caller-id", HeaderValue::from_str(&cli.caller)?);

    match cli.command {
        Commands::Register { lat, long } => {
            let res = client
                .post(format!("{}/api/v1/responders/location", cli.url))
                .headers(headers)
                .json(&json!({ "lat": lat, "long": long }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Verify { responder } => {
            let res = client
                .post(format!("{}/api/v1/responders/{}/verify", cli.url, responder))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::SetAuthority { new_authority } => {
            let res = client
                .put(format!("{}/api/v1/authority", cli.url))
                .headers(headers)
                .json(&json!({ "new_authority": new_authority }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Route { alert_id, lat, long, radius, retries, backoff_ms } => {
            let url = format!("{}/api/v1/alerts/{}/route", cli.url, alert_id);
            let mut attempt = 0;
            loop {
                // Later attempts reuse the radius the router stored.
                let initial_radius = if attempt == 0 { radius } else { 0 };
                let res = client
                    .post(&url)
                    .headers(headers.clone())
                    .json(&json!({ "lat": lat, "long": long, "initial_radius": initial_radius }))
                    .send()
                    .await?;

                let status = res.status();
                let body: Value = res.json().await.unwrap_or(Value::Null);
                let no_responders = status == StatusCode::NOT_FOUND && body["error"] == "no_responders";

                if !no_responders || attempt >= retries {
                    print_body(status, &body)?;
                    break;
                }

                attempt += 1;
                let delay = retry_delay(attempt, backoff_ms);
                eprintln!(
                    "No responders within {} m, retrying at {} m in {:?}",
                    body["searched_radius"], body["search_radius"], delay
                );
                tokio::time::sleep(delay).await;
            }
        }
        Commands::Get { alert_id } => {
            let res = client
                .get(format!("{}/api/v1/alerts/{}/routing", cli.url, alert_id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reset { alert_id } => {
            let res = client
                .delete(format!("{}/api/v1/alerts/{}/routing", cli.url, alert_id))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let mut admin_headers = HeaderMap::new();
            admin_headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
            );
            let res = client
                .get(format!("{}/admin/status", cli.admin_url))
                .headers(admin_headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    print_body(status, &body)
}

fn print_body(status: StatusCode, body: &Value) -> Result<(), Box<dyn std::error::Error>> {
    if !status.is_success() {
        eprintln!("Error: router returned status {}", status);
        eprintln!("Response: {}", serde_json::to_string_pretty(body)?);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
