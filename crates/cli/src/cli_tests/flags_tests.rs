// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;

/// Test that only allowed long-form flags have short forms,
/// all allowed short forms are correctly mapped, and all
/// entries in the allowed set are actually used somewhere.
#[test]
fn test_flag_consistency() {
    use clap::CommandFactory;

    // Note: -h/--help and -V/--version are auto-managed by clap
    let allowed: std::collections::HashMap<char, &str> = [('o', "output")].into_iter().collect();

    let cmd = Cli::command();
    let mut errors = Vec::new();
    let mut used_shorts: std::collections::HashSet<char> = std::collections::HashSet::new();
    check_command_flags(&cmd, &allowed, &mut errors, &mut used_shorts);

    for (short_char, long_name) in &allowed {
        if !used_shorts.contains(short_char) {
            errors.push(format!("-{} (--{}) is in allowed set but never used", short_char, long_name));
        }
    }

    if !errors.is_empty() {
        panic!("Flag consistency violations:\n{}", errors.join("\n"));
    }
}

fn check_command_flags(
    cmd: &clap::Command,
    allowed: &std::collections::HashMap<char, &str>,
    errors: &mut Vec<String>,
    used_shorts: &mut std::collections::HashSet<char>,
) {
    let cmd_name = cmd.get_name();

    for arg in cmd.get_arguments() {
        let long = arg.get_long();
        let Some(short_char) = arg.get_short() else {
            continue;
        };
        if (short_char == 'h' && long == Some("help")) || (short_char == 'V' && long == Some("version")) {
            continue;
        }

        used_shorts.insert(short_char);

        match (allowed.get(&short_char), long) {
            (Some(expected), Some(actual)) if actual != *expected => errors.push(format!(
                "{}: -{} maps to --{} but should map to --{}",
                cmd_name, short_char, actual, expected
            )),
            (Some(expected), None) => {
                errors.push(format!("{}: -{} has no long form, expected --{}", cmd_name, short_char, expected))
            }
            (None, _) => errors.push(format!(
                "{}: -{} (--{}) is not an allowed short flag",
                cmd_name,
                short_char,
                long.unwrap_or("(none)")
            )),
            _ => {}
        }
    }

    for subcmd in cmd.get_subcommands() {
        check_command_flags(subcmd, allowed, errors, used_shorts);
    }
}

#[test]
fn test_cli_definition_is_valid() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["tether", "queue", "list", "-o", "json", "--data-dir", "/tmp/t", "--verbose"]).unwrap();
    assert_eq!(cli.output, OutputFormat::Json);
    assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/t")));
    assert!(cli.verbose);
}

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["tether", "sync"]).unwrap();
    assert_eq!(cli.output, OutputFormat::Text);
    assert!(cli.data_dir.is_none());
    assert!(!cli.verbose);
    assert!(matches!(cli.command, Command::Sync));
}
