//! Command dispatch: bridges CLI args -> Inventory calls -> output formatting.

pub mod config_cmd;
pub mod products;
pub mod profile;
pub mod session;
pub mod suppliers;
pub mod sync;
pub mod util;

use secrecy::SecretString;

use inventrack_core::{Inventory, SessionUser};

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Everything a server-bound command needs: the data layer for the
/// resolved profile, and the profile itself for credentials.
pub struct Context {
    pub inventory: Inventory,
    pub target: Target,
}

impl Context {
    /// Open the profile's cache. Does not contact the server.
    pub fn open(target: Target) -> Result<Self, CliError> {
        let inventory = Inventory::new(target.client.clone())?;
        Ok(Self { inventory, target })
    }

    /// Sign in with the profile's credentials.
    pub async fn sign_in(&self) -> Result<SessionUser, CliError> {
        let (email, password) = self.target.credentials()?;
        self.login(&email, &password).await
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SessionUser, CliError> {
        self.inventory
            .login(email, password)
            .await
            .map_err(|err| match CliError::from(err) {
                CliError::AuthFailed { message, .. } => CliError::AuthFailed {
                    profile: self.target.profile_name.clone(),
                    message,
                },
                other => other,
            })
    }
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Products(args) => products::handle(ctx, args, global).await,
        Command::Suppliers(args) => suppliers::handle(ctx, args, global).await,
        Command::Profile(args) => profile::handle(ctx, args, global).await,
        Command::Session(args) => session::handle(ctx, args, global).await,
        Command::Sync => sync::handle(ctx, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
