//! # Registry subcommands
//!
//! `role` resolves one actor; `actors` lists the registry projection and,
//! with `--events`, the underlying event log.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use pharma_core::ActorId;
use pharma_ledger::{PharmaChain, RegistryEventKind, RoleResolution};
use pharma_state::Role;

use crate::write_json;

/// Arguments for `role`.
#[derive(Args, Debug)]
pub struct RoleArgs {
    /// Actor identifier (64 hex characters).
    pub actor: ActorId,
}

/// Arguments for `actors`.
#[derive(Args, Debug)]
pub struct ActorsArgs {
    /// Print the registry event log instead of the current table.
    #[arg(long)]
    pub events: bool,
}

#[derive(Serialize)]
struct RoleLine {
    actor: ActorId,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

/// Resolve an actor's role.
pub fn run_role(args: &RoleArgs, chain: &PharmaChain, json: bool, out: &mut impl Write) -> Result<u8> {
    let line = match chain.resolve_role(&args.actor) {
        RoleResolution::Registered(role) => RoleLine {
            actor: args.actor,
            status: "registered",
            role: Some(role),
        },
        RoleResolution::Revoked(role) => RoleLine {
            actor: args.actor,
            status: "revoked",
            role: Some(role),
        },
        RoleResolution::Unknown => RoleLine {
            actor: args.actor,
            status: "unknown",
            role: None,
        },
    };
    if json {
        write_json(out, &line)?;
    } else {
        match line.role {
            Some(role) => writeln!(out, "{} {} {role}", line.actor, line.status)?,
            None => writeln!(out, "{} {}", line.actor, line.status)?,
        }
    }
    Ok(0)
}

/// List registered actors or the event log.
pub fn run_actors(
    args: &ActorsArgs,
    chain: &PharmaChain,
    json: bool,
    out: &mut impl Write,
) -> Result<u8> {
    let registry = chain.registry();
    if args.events {
        if json {
            write_json(out, &registry.events())?;
            return Ok(0);
        }
        for event in registry.events() {
            let what = match &event.kind {
                RegistryEventKind::Registered { actor, role } => format!("register {actor} as {role}"),
                RegistryEventKind::Revoked { actor } => format!("revoke {actor}"),
            };
            writeln!(out, "#{:<3} {}  {what}", event.sequence, event.timestamp)?;
        }
        return Ok(0);
    }

    if json {
        let table: Vec<_> = registry
            .actors()
            .map(|(actor, record)| {
                serde_json::json!({
                    "actor": actor,
                    "role": record.role,
                    "revoked": record.revoked,
                })
            })
            .collect();
        write_json(out, &table)?;
        return Ok(0);
    }
    writeln!(out, "Authority: {}", registry.authority())?;
    for (actor, record) in registry.actors() {
        let status = if record.revoked { "revoked" } else { "active" };
        writeln!(out, "  {actor}  {:<12} {status}", record.role.to_string())?;
    }
    Ok(0)
}
