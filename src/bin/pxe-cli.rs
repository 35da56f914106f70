use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "pxe-cli")]
#[command(about = "Management CLI for the PXE fleet manager", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "PXE_URL")]
    url: String,

    /// Bearer token; not needed from whitelisted addresses.
    #[arg(short, long, env = "PXE_AUTH_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// List servers, optionally by status (pending, confirmed, installed)
    Servers {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one server
    Server { serial: String },
    /// Confirm a pending server
    Confirm { serial: String },
    /// Mark a confirmed server as installed
    Install { serial: String },
    /// List config templates
    Configs,
    /// Generate boot config for a server from a template
    Apply {
        id: i64,
        #[arg(long)]
        serial: String,
    },
    /// Page through the audit log
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value = "desc")]
        order: String,
    },
    /// Submit a self-report, as an installer would
    Report {
        #[arg(long)]
        serial: String,
        #[arg(long)]
        mac: String,
        #[arg(long, default_value = "")]
        hostname: String,
        #[arg(long, default_value = "")]
        ip: String,
        #[arg(long, default_value = "")]
        gateway: String,
        /// Delivery id; a fresh UUID when omitted.
        #[arg(long)]
        request_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/').to_string();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    }

    let request = match cli.command {
        Commands::Health => client.get(format!("{}/api/health", base)),
        Commands::Servers { status } => {
            let req = client.get(format!("{}/api/servers", base));
            match status {
                Some(status) => req.query(&[("status", status)]),
                None => req,
            }
        }
        Commands::Server { serial } => client.get(format!("{}/api/servers/{}", base, serial)),
        Commands::Confirm { serial } => client.post(format!("{}/api/servers/{}/confirm", base, serial)),
        Commands::Install { serial } => client.post(format!("{}/api/servers/{}/install", base, serial)),
        Commands::Configs => client.get(format!("{}/api/configs", base)),
        Commands::Apply { id, serial } => client
            .post(format!("{}/api/configs/{}/apply", base, id))
            .query(&[("serial", serial)]),
        Commands::Audit { limit, offset, order } => client
            .get(format!("{}/api/audit/logs", base))
            .query(&[("limit", limit.to_string()), ("offset", offset.to_string()), ("order", order)]),
        Commands::Report {
            serial,
            mac,
            hostname,
            ip,
            gateway,
            request_id,
        } => {
            let request_id = request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            client.post(format!("{}/api/report", base)).json(&json!({
                "requestId": request_id,
                "serial": serial,
                "macAddress": mac,
                "hostname": hostname,
                "ipAddress": ip,
                "gateway": gateway,
            }))
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
