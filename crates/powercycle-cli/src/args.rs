//! Command-line arguments.

use clap::{Parser, Subcommand};
use powercycle_control::{ComputeConfig, ControlConfig, TransitionKind};

/// Powercycle - start, stop or reboot a compute instance and wait for it.
#[derive(Parser, Debug)]
#[command(name = "powercycle")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Compute API URL.
    #[arg(long, env = "COMPUTE_API_URL", default_value = "http://localhost:8080")]
    pub compute_url: String,

    /// Bearer token for the compute API.
    #[arg(long, env = "COMPUTE_API_TOKEN")]
    pub token: Option<String>,

    /// Instance to act on.
    #[arg(long, env = "INSTANCE_ID")]
    pub instance_id: String,

    /// Seconds between state polls.
    #[arg(long, env = "POLL_INTERVAL_SECONDS", default_value_t = 15)]
    pub poll_interval: u64,

    /// Upper bound on each wait, in seconds.
    #[arg(long, env = "MAX_WAIT_SECONDS", default_value_t = 600)]
    pub max_wait: u64,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    pub debug: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a stopped instance.
    Start,
    /// Stop a running instance.
    Stop,
    /// Stop then start a running instance.
    #[command(alias = "restart")]
    Reboot,
    /// Print the instance's current state.
    Status,
}

impl Command {
    /// The transition this command runs, if any.
    pub const fn transition(self) -> Option<TransitionKind> {
        match self {
            Self::Start => Some(TransitionKind::Start),
            Self::Stop => Some(TransitionKind::Stop),
            Self::Reboot => Some(TransitionKind::Reboot),
            Self::Status => None,
        }
    }
}

impl Args {
    /// Compute client settings.
    pub fn compute_config(&self) -> ComputeConfig {
        let config = ComputeConfig::new(&self.compute_url);
        match &self.token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }

    /// Controller settings.
    pub fn control_config(&self) -> ControlConfig {
        ControlConfig {
            poll_interval_seconds: self.poll_interval,
            max_wait_seconds: self.max_wait,
            ..ControlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stop() {
        let args = Args::try_parse_from([
            "powercycle",
            "--instance-id",
            "i-0abc",
            "--compute-url",
            "http://compute:9000",
            "--poll-interval",
            "5",
            "stop",
        ])
        .unwrap();

        assert_eq!(args.command, Command::Stop);
        assert_eq!(args.command.transition(), Some(TransitionKind::Stop));
        assert_eq!(args.instance_id, "i-0abc");

        let control = args.control_config();
        assert_eq!(control.poll_interval_seconds, 5);
        assert_eq!(control.max_wait_seconds, 600);
        assert_eq!(args.compute_config().base_url, "http://compute:9000");
    }

    #[test]
    fn restart_is_reboot() {
        let args =
            Args::try_parse_from(["powercycle", "--instance-id", "i-0abc", "restart"]).unwrap();
        assert_eq!(args.command, Command::Reboot);
    }

    #[test]
    fn status_has_no_transition() {
        assert_eq!(Command::Status.transition(), None);
    }

    #[test]
    fn token_is_attached() {
        let args = Args::try_parse_from([
            "powercycle",
            "--instance-id",
            "i-0abc",
            "--token",
            "s3cret",
            "status",
        ])
        .unwrap();
        assert_eq!(args.compute_config().api_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn subcommand_required() {
        assert!(Args::try_parse_from(["powercycle", "--instance-id", "i-0abc"]).is_err());
    }
}
