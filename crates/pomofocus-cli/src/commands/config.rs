use clap::Subcommand;
use pomofocus_core::Pomofocus;

use super::{print_json, report_events, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "pomodoro", "alarm_volume")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CmdResult {
    let mut app = Pomofocus::open()?;
    match action {
        ConfigAction::Get { key } => match app.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            app.set_setting(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => print_json(app.settings())?,
        ConfigAction::Reset => {
            app.reset_settings()?;
            println!("config reset to defaults");
        }
    }
    report_events(&mut app);
    Ok(())
}
