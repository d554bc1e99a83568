//! Task template commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use pomofocus_core::Pomofocus;

use super::{print_json, report_events, CmdResult};

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Save tasks as a reusable template
    Save {
        /// Template name
        name: String,
        /// IDs of the tasks to include
        #[arg(required = true)]
        tasks: Vec<String>,
    },
    /// Add a template's tasks to today's list
    Apply {
        /// Template ID or name
        template: String,
    },
    /// List saved templates
    List,
    /// Delete a template
    Delete {
        /// Template ID or name
        template: String,
    },
}

pub fn run(action: TemplateAction) -> CmdResult {
    let mut app = Pomofocus::open()?;
    let now = Utc::now();

    match action {
        TemplateAction::Save { name, tasks } => {
            let template = app.save_template(&name, &tasks, now)?;
            print_json(&template)?;
        }
        TemplateAction::Apply { template } => {
            let added = app.apply_template(&template, now)?;
            println!("added {added} tasks");
        }
        TemplateAction::List => print_json(app.templates())?,
        TemplateAction::Delete { template } => {
            if !app.delete_template(&template, now) {
                return Err(format!("no template named {template}").into());
            }
            println!("deleted {template}");
        }
    }

    report_events(&mut app);
    Ok(())
}
