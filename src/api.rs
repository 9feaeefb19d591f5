use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::types::{Command, CommandResult, Credentials, HvacStatus};
use crate::{Error, Result};

/// Remote side of the unit: anything able to report status and run commands.
///
/// Implementations classify transport failures themselves. `Err` from any
/// method is treated by the core as an unexpected failure.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Performs the initial handshake and returns the resolved serial number.
    async fn initialize(&self, credentials: &Credentials) -> Result<Option<String>>;

    async fn get_status(&self) -> Result<HvacStatus>;

    async fn run_command(&self, command: &Command) -> Result<CommandResult>;
}

pub(crate) enum Outcome {
    /// Accepted by the cloud, the optimistic value may be cached.
    Applied,
    /// Rejected or failed unexpectedly, the cache must be re-read.
    Resync,
    /// Cloud unreachable, nothing changes.
    Unchanged,
}

/// Runs one command and reports the outcome. Never fails.
pub(crate) async fn execute<A: CloudApi + ?Sized>(api: &A, scope: &str, command: &Command) -> Outcome {
    debug!(scope = %scope, command = %command, "sending command");

    let result = match api.run_command(command).await {
        Ok(CommandResult::Success) => Ok(()),
        Ok(CommandResult::Failure) => Err(Error::CommandRejected(command.to_string())),
        Ok(CommandResult::Unreachable) => Err(Error::Unreachable(command.to_string())),
        Err(e) => Err(Error::Unexpected(format!("{command}: {e}"))),
    };

    match result {
        Ok(()) => Outcome::Applied,
        Err(e) if e.needs_resync() => {
            error!(scope = %scope, "{e}, refreshing state from cloud");
            Outcome::Resync
        }
        Err(e) => {
            warn!(scope = %scope, "{e}");
            Outcome::Unchanged
        }
    }
}
