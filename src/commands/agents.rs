// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::agent::Section;
use crate::cluster::Cluster;
use crate::commands;

#[derive(Args, Debug, Clone)]
pub struct AgentsArgs {
    /// Describe the parameters of this agent instead of listing all agents.
    #[arg()]
    name: Option<String>,

    #[arg(long, default_value = "ocf")]
    class: String,

    #[arg(long)]
    provider: Option<String>,
}

pub fn agents(cluster: &Cluster, args: &AgentsArgs) -> commands::Result {
    let catalog = cluster.catalog();

    let Some(name) = &args.name else {
        for agent in catalog.agents() {
            let installed = if agent.is_installed() {
                ""
            } else {
                " (not installed)"
            };
            println!("{}{installed}", agent.id());
        }
        return Ok(());
    };

    if !catalog.contains(name, args.provider.as_deref(), &args.class) {
        eprintln!("Unknown agent \"{name}\"");
        return commands::err();
    }
    let agent = catalog.resolve(name, args.provider.as_deref(), &args.class);

    println!("{}", agent.id());
    if let Some(desc) = agent.shortdesc() {
        println!("\t{desc}");
    }
    for section in [Section::Required, Section::Optional, Section::Stonith, Section::Meta] {
        let params: Vec<_> = agent
            .parameters()
            .iter()
            .filter(|p| p.section == section)
            .collect();
        if params.is_empty() {
            continue;
        }
        println!("=== {section} ===");
        for p in params {
            print!("{} ({})", p.label, p.param_type);
            if let Some(default) = &p.default {
                print!(" default: {default}");
            }
            let choices = p.choices_for(agent.is_master_slave());
            if !choices.is_empty() {
                print!(" choices: {}", choices.join("|"));
            }
            println!();
        }
    }

    Ok(())
}
