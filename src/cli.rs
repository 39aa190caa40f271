use clap::Parser;

/// Interactive client for the line-oriented chat protocol.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server address to connect to.
    #[arg(short, long, default_value = "0.0.0.0")]
    pub address: String,

    /// Server port to connect to.
    #[arg(short, long, default_value_t = 5378)]
    pub port: u16,
}
