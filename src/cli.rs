use clap::Parser;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub payload: String,
    pub timeout_secs: u64,
}

#[derive(Parser, Debug)]
#[command(name = "lsp-stdio")]
#[command(about = "Round-trip a framed message through a language server over stdio", long_about = None)]
pub struct Cli {
    /// Path to the server executable
    pub server: String,

    /// Raw message body to send (defaults to a JSON-RPC ping)
    #[arg(long)]
    pub payload: Option<String>,

    /// Seconds to wait for the first complete response
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn into_config(self) -> Config {
        Config {
            server: self.server,
            payload: self.payload.unwrap_or_else(|| {
                serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "ping",
                })
                .to_string()
            }),
            timeout_secs: self.timeout,
        }
    }
}
