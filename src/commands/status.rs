// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::cluster::Cluster;
use crate::commands;

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Only print resources that are stopped, unmanaged, orphaned or have failed.
    #[arg(short = 'x')]
    exclude_normal: bool,
}

pub fn status(cluster: &Cluster, args: &StatusArgs) -> commands::Result {
    let snapshot = cluster.snapshot();
    let report = cluster.resource_status();
    if report.is_none() {
        tracing::debug!("no status document, running state is unknown");
    }

    for res in snapshot.resources() {
        let failures: Vec<String> = snapshot
            .nodes()
            .iter()
            .filter_map(|node| {
                snapshot
                    .failed(node, &res.id)
                    .map(|count| format!("{node}={count}"))
            })
            .collect();
        let running = report.map(|r| r.running_on(&res.id)).unwrap_or_default();
        let managed = report.is_none_or(|r| r.is_managed(&res.id))
            && res.parameter("is-managed").is_none_or(crate::xml::is_true);

        let normal = !running.is_empty() && managed && failures.is_empty() && !res.orphaned;
        if args.exclude_normal && normal {
            continue;
        }

        let state = match (report, running.is_empty()) {
            (None, _) => "Unknown".to_string(),
            (Some(_), true) => "Stopped".to_string(),
            (Some(_), false) => format!("Running on {}", running.join(", ")),
        };
        print!("{}: {state}", res.id);
        if !managed {
            print!(" (unmanaged)");
        }
        if res.orphaned {
            print!(" (orphaned)");
        }
        if !failures.is_empty() {
            print!(" [failed: {}]", failures.join(", "));
        }
        println!();
    }

    Ok(())
}
