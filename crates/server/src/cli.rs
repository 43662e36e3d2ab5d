//! Command-line flags for the server binary.

use clap::Parser;

/// Cardsmith flashcard generation server.
#[derive(Parser, Debug)]
#[command(name = "cardsmith", version, about)]
pub struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "CARDSMITH_PROFILE")]
    pub profile: Option<String>,

    /// Override the configured listen port.
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Resolve the config for these flags. Call after `load_dotenv()`.
    pub fn load_config(&self) -> cardsmith_core::Config {
        let mut config = match self.profile.as_deref() {
            Some(profile) => cardsmith_core::Config::for_profile(profile),
            None => cardsmith_core::Config::from_env(),
        };
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_flag_overrides_config() {
        let cli = Cli::try_parse_from(["cardsmith", "--port", "8123"]).unwrap();
        assert_eq!(cli.port, Some(8123));
        assert_eq!(cli.load_config().server.port, 8123);
    }

    #[test]
    fn profile_flag_is_uppercased_by_config() {
        let cli = Cli::try_parse_from(["cardsmith", "--profile", "staging"]).unwrap();
        assert_eq!(cli.load_config().profile, "STAGING");
    }
}
