//! Rowcast server binary
//!
//! HTTP backend feeding spreadsheet rows to a broadcast overlay tool.

use clap::Parser;
use rowcast::api::{run_api_server, server::ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "rowcast-server")]
#[command(version)]
#[command(about = "Rowcast - spreadsheet ingestion backend for broadcast overlays")]
#[command(long_about = r#"
Rowcast Server

Upload an Excel spreadsheet, pick the active row, feed it to vMix.

Endpoints:
  - POST   /api/v1/upload              - Upload an Excel file (multipart field 'excel')
  - GET    /api/v1/elements            - List all imported rows
  - PUT    /api/v1/element/select/{id} - Select a row by id
  - GET    /api/v1/element/selected    - Current selection (overlay feed)
  - GET    /api/v1/status              - Server and store status
  - DELETE /api/v1/reset               - Clear the row store
  - GET    /health, /version, /        - Health, version, API index

Example usage:
  rowcast-server                             # Start on localhost:3000
  rowcast-server --host 0.0.0.0 --port 8080
  rowcast-server --cors-origin http://localhost:4200

  curl -F excel=@roster.xlsx http://localhost:3000/api/v1/upload
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "ROWCAST_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "ROWCAST_PORT")]
    port: u16,

    /// Restrict CORS to this origin (e.g. the front-end dev server)
    #[arg(long, env = "ROWCAST_CORS_ORIGIN")]
    cors_origin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        cors_origin: args.cors_origin,
    };

    run_api_server(config).await
}
