// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::cluster::Cluster;
use crate::commands;

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Also print constraints.
    #[arg(short, long)]
    constraints: bool,
}

pub fn show(cluster: &Cluster, args: &ShowArgs) -> commands::Result {
    cluster.print_summary(args.constraints);

    Ok(())
}
