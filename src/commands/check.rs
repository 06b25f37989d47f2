// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::cluster::Cluster;
use crate::commands;

#[derive(Args, Debug, Clone)]
pub struct CheckParamArgs {
    /// The agent type, such as "IPaddr2".
    agent: String,

    /// The parameter name.
    param: String,

    value: String,

    #[arg(long, default_value = "ocf")]
    class: String,

    #[arg(long)]
    provider: Option<String>,
}

/// Exits with a failing status if the value isn't acceptable.
pub fn check_param(cluster: &Cluster, args: &CheckParamArgs) -> commands::Result {
    let agent = cluster
        .catalog()
        .resolve(&args.agent, args.provider.as_deref(), &args.class);

    let Some(param) = agent.parameter(&args.param) else {
        eprintln!("{} has no parameter \"{}\"", agent.id(), args.param);
        return commands::err();
    };

    if param.check(&args.value) {
        println!("ok");
        Ok(())
    } else {
        eprintln!(
            "\"{}\" is not a valid {} for {}",
            args.value, param.param_type, param.label
        );
        commands::err()
    }
}
