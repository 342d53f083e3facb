//! Resource command handlers, shared by all eight resource families.

use std::sync::Arc;

use fleetgate_core::{EntityId, Gateway, Resource};

use crate::cli::{GlobalOpts, ResourceCommand};
use crate::error::CliError;
use crate::output;

use super::rows::Listed;
use super::util;

pub async fn handle<T: Listed>(
    gateway: &Gateway,
    command: ResourceCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = gateway.resource::<T>();
    let name = T::KIND.collection();

    match command {
        ResourceCommand::List => {
            let table = resource.list().await?;
            let records: Vec<Arc<T>> = table.entities().cloned().collect();
            let out = output::render_list(&global.output, &records, T::row, |r| {
                r.id().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ResourceCommand::Get { id } => {
            let record = resource
                .get(EntityId::from(id.as_str()))
                .await
                .map_err(|e| CliError::for_record(e, name, &id))?;
            print_record(record.as_ref(), global);
            Ok(())
        }

        ResourceCommand::Create(body) => {
            let body = util::read_body(&body)?;
            match resource.create(body).await? {
                Some(record) => print_record(&record, global),
                None => status(global, &format!("{} created", T::KIND)),
            }
            Ok(())
        }

        ResourceCommand::Update { id, body } => {
            let body = util::read_body(&body)?;
            let updated = resource
                .update(EntityId::from(id.as_str()), body)
                .await
                .map_err(|e| CliError::for_record(e, name, &id))?;
            match updated {
                Some(record) => print_record(&record, global),
                None => status(global, &format!("{name} '{id}' updated")),
            }
            Ok(())
        }

        ResourceCommand::Delete { ids } => {
            let prompt = match ids.as_slice() {
                [one] => format!("Delete {name} '{one}'?"),
                many => format!("Delete {} {name}?", many.len()),
            };
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            if let [one] = ids.as_slice() {
                resource
                    .delete(EntityId::from(one.as_str()))
                    .await
                    .map_err(|e| CliError::for_record(e, name, one))?;
            } else {
                resource.delete_many(util::ids(&ids)).await?;
            }
            status(global, &format!("Deleted {} {name}", ids.len()));
            Ok(())
        }
    }
}

pub(super) fn print_record<T: Resource>(record: &T, global: &GlobalOpts) {
    let out = output::render_single(&global.output, record, |r| r.id().to_string());
    output::print_output(&out, global.quiet);
}

/// Progress line on stderr, suppressed by `--quiet`.
pub(super) fn status(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}
