// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Parser;

use crmconf_lib::commands::{self, Cli};

/// The crmconf client reads the documents named in its config file and prints what it found.
///
/// If launched with no sub-command, the configuration summary is printed.
fn main() {
    let args = Cli::parse();

    crmconf_lib::initialize_logging(args.verbose);

    if commands::main(&args).is_err() {
        std::process::exit(1);
    }
}
