//! Resource-specific actions beyond CRUD.

use fleetgate_core::{EntityId, Gateway};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::resources::{print_record, status};
use super::util;

pub async fn close_rent(gateway: &Gateway, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm(&format!("Close rent '{id}'?"), global.yes)? {
        return Ok(());
    }
    let closed = gateway
        .close_rent(EntityId::from(id))
        .await
        .map_err(|e| CliError::for_record(e, "rents", id))?;
    match closed {
        Some(rent) => print_record(&rent, global),
        None => status(global, &format!("Rent '{id}' closed")),
    }
    Ok(())
}

pub async fn mark_read(gateway: &Gateway, ids: &[String], global: &GlobalOpts) -> Result<(), CliError> {
    gateway.mark_notifications_read(util::ids(ids)).await?;
    if ids.is_empty() {
        status(global, "All notifications marked read");
    } else {
        status(global, &format!("Marked {} notification(s) read", ids.len()));
    }
    Ok(())
}
