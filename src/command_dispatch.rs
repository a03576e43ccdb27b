//! Purpose: Run the single cast transaction for one `cast` invocation.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate the load/mutate/save/display flow.
//! Invariants: A missing `--file` target is only created when a mutation is requested.
//! Invariants: When both `--delete` and a message are given, the delete runs and the message is ignored.

use super::*;
use crate::cast_paths::resolve_cast_target;
use tracing::info;

pub(super) fn dispatch_command(cli: Cli) -> Result<RunOutcome, Error> {
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::aot::generate(shell, &mut cmd, "cast", &mut io::stdout());
        return Ok(RunOutcome::ok());
    }

    let target = resolve_cast_target(cli.file, cli.dir.as_deref())?;
    let exists = target.exists();
    let mut store = if exists {
        CastStore::load(&target)?
    } else {
        CastStore::create_empty()
    };
    let name = target.display().to_string();
    let is_alert = cli.alert || cli.alert_exit;

    if let Some(count) = cli.delete {
        let removed = store.delete_messages(count, is_alert);
        store.save(&target)?;
        info!(
            "Deleted {removed} {} from {name}",
            deleted_noun(removed, is_alert)
        );
    } else if let Some(msg) = cli.msg {
        store.add_message(msg, is_alert, cli.alert_exit);
        store.save(&target)?;
        info!("Added message to {name}");
    } else if !exists {
        return Err(Error::new(ErrorKind::NotFound)
            .with_message(format!("{name} does not exist"))
            .with_path(&target));
    }

    if cli.json {
        emit_json(&name, &store);
    } else {
        emit_banner(&name, &store);
    }
    Ok(RunOutcome::ok())
}

fn deleted_noun(count: usize, is_alert: bool) -> &'static str {
    if is_alert {
        "alert message"
    } else if count > 1 {
        "messages"
    } else {
        "message"
    }
}
