//! Config subcommand handlers.

use tracing::info;

use commitgrab_config::{Config, PopupState, StateStore};

use crate::cli::ConfigAction;

/// Handle config subcommands.
pub(crate) fn handle_config_command(
    config: &Config,
    action: ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = StateStore::new(&config.storage.state_file);

    match action {
        ConfigAction::Show => show(config, &store),
        ConfigAction::SetTicketRegex { pattern } => update(&store, |state| {
            state.set_ticket_regex(&pattern)?;
            println!("Ticket pattern set to {}", state.ticket_regex);
            Ok(())
        }),
        ConfigAction::SetCleanRegex { pattern } => update(&store, |state| {
            state.set_clean_regex(&pattern)?;
            println!("Clean pattern set to {}", state.clean_regex);
            Ok(())
        }),
        ConfigAction::Reset => update(&store, |state| {
            let defaults = PopupState::default();
            state.ticket_regex = defaults.ticket_regex;
            state.clean_regex = defaults.clean_regex;
            println!("Patterns restored to defaults");
            Ok(())
        }),
    }
}

fn show(config: &Config, store: &StateStore) -> Result<(), Box<dyn std::error::Error>> {
    let state = store.load()?;

    println!("{}", toml::to_string_pretty(config)?);
    println!("# Stored patterns ({})", store.path().display());
    println!("ticket_regex = {:?}", state.ticket_regex);
    println!("clean_regex = {:?}", state.clean_regex);
    if config.patterns.ticket.is_some() || config.patterns.clean.is_some() {
        println!("# [patterns] in the config file take precedence");
    }
    Ok(())
}

/// Load, modify and save the state; nothing is written if `f` fails.
fn update<F>(store: &StateStore, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut PopupState) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut state = store.load()?;
    f(&mut state)?;
    store.save(&state)?;
    info!("Updated state at {}", store.path().display());
    Ok(())
}
