//! Command dispatch: bridges CLI args -> gateway calls -> output formatting.

pub mod actions;
pub mod config_cmd;
pub mod resources;
pub mod rows;
pub mod session;
pub mod util;

use fleetgate_core::{Car, Customer, Damage, Driver, Gateway, Notification, Payment, Rent, User};

use crate::cli::{Command, GlobalOpts, NotificationsCommand, RentsCommand};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
///
/// The gateway is already logged in.
pub async fn dispatch(cmd: Command, gateway: &Gateway, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login => {
            session::whoami(gateway, global);
            Ok(())
        }
        Command::Users(args) => resources::handle::<User>(gateway, args.command, global).await,
        Command::Customers(args) => {
            resources::handle::<Customer>(gateway, args.command, global).await
        }
        Command::Cars(args) => resources::handle::<Car>(gateway, args.command, global).await,
        Command::Drivers(args) => resources::handle::<Driver>(gateway, args.command, global).await,
        Command::Damages(args) => resources::handle::<Damage>(gateway, args.command, global).await,
        Command::Payments(args) => {
            resources::handle::<Payment>(gateway, args.command, global).await
        }
        Command::Rents(args) => match args.command {
            RentsCommand::Common(command) => {
                resources::handle::<Rent>(gateway, command, global).await
            }
            RentsCommand::Close { id } => actions::close_rent(gateway, &id, global).await,
        },
        Command::Notifications(args) => match args.command {
            NotificationsCommand::Common(command) => {
                resources::handle::<Notification>(gateway, command, global).await
            }
            NotificationsCommand::MarkRead { ids } => {
                actions::mark_read(gateway, &ids, global).await
            }
        },
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
