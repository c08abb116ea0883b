use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: String,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Milliseconds clients should wait before reconnecting a dropped stream.
    /// Sent to every client as a `retry` field. Unset leaves the browser default.
    #[arg(long, env)]
    pub reconnect_interval_ms: Option<u32>,

    /// Seconds between keep-alive comments on idle streams; 0 disables them
    #[arg(long, env, default_value_t = 15)]
    pub keep_alive_interval_secs: u64,

    /// Number of encoded frames buffered per client before writes wait on it
    #[arg(long, env, default_value_t = 64,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    pub sse_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.interface, self.port)
    }

    /// The keep-alive period, or `None` when keep-alives are disabled.
    pub fn keep_alive_interval(&self) -> Option<Duration> {
        match self.keep_alive_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
