// SPDX-License-Identifier: Apache-2.0

use colored::Colorize;
use synthbench::SynthbenchError;

pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let subcommand_str = match subcommand {
        Some(subcommand) => format!("{}: ", subcommand),
        None => String::new(),
    };
    eprintln!("synthbench-driver: {}{}", subcommand_str, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
    std::process::exit(1);
}

/// Reports a handler failure, listing each context layer and, for tool
/// failures, where the tool's log was written.
pub fn report_handler_error_and_exit(subcommand: &str, error: &anyhow::Error) -> ! {
    let causes: Vec<String> = error.chain().skip(1).map(|c| c.to_string()).collect();
    let log_path = error
        .chain()
        .find_map(|c| match c.downcast_ref::<SynthbenchError>() {
            Some(SynthbenchError::ProcessFailure {
                log_path: Some(path),
                ..
            }) => Some(path.display().to_string()),
            _ => None,
        });
    let mut details: Vec<(&str, &str)> = causes.iter().map(|c| ("caused by", c.as_str())).collect();
    if let Some(path) = &log_path {
        details.push(("tool log", path.as_str()));
    }
    report_cli_error_and_exit(&error.to_string(), Some(subcommand), details)
}
