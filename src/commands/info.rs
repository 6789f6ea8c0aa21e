use super::{Command, CommandSettings};

pub(super) fn handle_about(settings: &CommandSettings) -> String {
    format!(
        "hearsay is an authorship attribution and natural language processing bot. It works by \
         training a machine learning model on stylometric features such as word length \
         frequency, punctuation, character n-grams, and capitalization. The model can then \
         predict likely authors from unknown messages and compare similarities between authors. \
         You must manually opt in to use hearsay. Get help with {}help.",
        settings.prefix
    )
}

pub(super) fn handle_help(settings: &CommandSettings, args: &[String]) -> String {
    let prefix = &settings.prefix;
    match args.first() {
        None => {
            let names: Vec<&str> = Command::ALL.iter().map(|cmd| cmd.name()).collect();
            format!(
                "Available commands are {}. Usage: {prefix}help [command]",
                names.join(", ")
            )
        }
        Some(name) => match Command::from_name(name) {
            Some(cmd) => cmd.description(prefix),
            None => format!("No such command {name}."),
        },
    }
}
