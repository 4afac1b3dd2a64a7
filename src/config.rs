use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::rate_limit::RateLimitConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "leadform")]
#[command(about = "Send contact form leads to a webhook, with client-side rate limiting")]
pub struct Args {
    // Webhook that receives the leads
    #[arg(long, env = "LEADFORM_WEBHOOK_URL", default_value = "", global = true)]
    pub webhook_url: String,

    // Where the profile storage lives (defaults to the user data dir)
    #[arg(long, env = "LEADFORM_PROFILE_DIR", global = true)]
    pub profile_dir: Option<PathBuf>,

    // Max successful submissions per window
    #[arg(long, default_value_t = 3, global = true)]
    pub max_attempts: usize,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60, global = true)]
    pub window_secs: u64,

    // Block duration in seconds once the limit is hit
    #[arg(long, default_value_t = 300, global = true)]
    pub cooldown_secs: u64,

    // Webhook request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    // How long feedback messages stay up
    #[arg(long, default_value_t = 5000, global = true)]
    pub display_timeout_ms: u64,

    // Dump prometheus metrics after the command
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Submit a lead
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Show rate limit state for this profile
    Status,
    /// Show or change the display language (en, ru or toggle)
    Lang { language: Option<String> },
}

impl Args {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_attempts: self.max_attempts,
            window: Duration::from_secs(self.window_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn display_timeout(&self) -> Duration {
        Duration::from_millis(self.display_timeout_ms)
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(default_profile_dir)
    }
}

pub fn default_profile_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leadform")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_rate_limit_defaults() {
        let args = Args::parse_from(["leadform", "status"]);
        assert_eq!(args.rate_limit(), RateLimitConfig::default());
        assert_eq!(args.display_timeout(), Duration::from_millis(5000));
        assert!(matches!(args.command, Command::Status));
    }

    #[test]
    fn test_submit_args() {
        let args = Args::parse_from([
            "leadform",
            "--webhook-url",
            "https://hooks.example.com/x",
            "submit",
            "--name",
            "Ann",
            "--message",
            "hello",
            "--max-attempts",
            "5",
        ]);
        assert_eq!(args.webhook_url, "https://hooks.example.com/x");
        assert_eq!(args.max_attempts, 5);
        match args.command {
            Command::Submit { name, email, message } => {
                assert_eq!(name, "Ann");
                assert_eq!(email, "");
                assert_eq!(message, "hello");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_explicit_profile_dir() {
        let args = Args::parse_from(["leadform", "--profile-dir", "/tmp/p", "lang"]);
        assert_eq!(args.profile_dir(), PathBuf::from("/tmp/p"));
    }
}
