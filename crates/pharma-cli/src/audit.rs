//! # Audit subcommands
//!
//! `verify`, `trace`, `history`, and `status`. All of them only read.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use pharma_core::BatchId;
use pharma_ledger::{ErrorKind, PharmaChain};

use crate::{short, write_json, EXIT_INTEGRITY_FAILURE};

/// Arguments for `verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Batch to verify (`7` or `batch:7`). Verifies every batch if omitted.
    pub batch: Option<BatchId>,
}

/// Arguments naming a single batch.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Batch identifier (`7` or `batch:7`).
    pub batch: BatchId,
}

/// Arguments for `status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Batch to show. Lists every batch if omitted.
    pub batch: Option<BatchId>,
}

#[derive(Serialize)]
struct VerifyLine {
    batch_id: BatchId,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<pharma_ledger::ProvenanceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Replay histories and compare them with the stored projections.
///
/// An unknown batch is an ordinary error. [`EXIT_INTEGRITY_FAILURE`] is
/// returned only when a known batch fails verification.
pub fn run_verify(
    args: &VerifyArgs,
    chain: &PharmaChain,
    json: bool,
    out: &mut impl Write,
) -> Result<u8> {
    let results = match args.batch {
        Some(id) => match chain.verify_provenance(id) {
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(e.into()),
            result => vec![(id, result)],
        },
        None => chain.verifier().verify_all(),
    };

    let lines: Vec<VerifyLine> = results
        .into_iter()
        .map(|(batch_id, result)| match result {
            Ok(report) => VerifyLine {
                batch_id,
                ok: true,
                report: Some(report),
                error: None,
            },
            Err(e) => VerifyLine {
                batch_id,
                ok: false,
                report: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    let failures = lines.iter().filter(|l| !l.ok).count();

    if json {
        write_json(out, &lines)?;
    } else {
        for line in &lines {
            match (&line.report, &line.error) {
                (Some(r), _) => writeln!(
                    out,
                    "OK    {:<10} {:<13} records={:<3} head={}",
                    line.batch_id.to_string(),
                    r.state,
                    r.records,
                    r.head_digest
                )?,
                (None, Some(e)) => writeln!(out, "FAIL  {:<10} {e}", line.batch_id.to_string())?,
                (None, None) => {}
            }
        }
        writeln!(out)?;
        writeln!(out, "{} verified, {failures} failed", lines.len() - failures)?;
    }

    Ok(if failures == 0 { 0 } else { EXIT_INTEGRITY_FAILURE })
}

/// Print the custody chain of a batch.
pub fn run_trace(
    args: &BatchArgs,
    chain: &PharmaChain,
    json: bool,
    out: &mut impl Write,
) -> Result<u8> {
    let steps = chain.trace(args.batch)?;
    if json {
        write_json(out, &steps)?;
        return Ok(0);
    }
    writeln!(out, "Custody trace for {}:", args.batch)?;
    for (i, step) in steps.iter().enumerate() {
        writeln!(
            out,
            "  {}. {}  since seq {} ({}, {})",
            i + 1,
            step.custodian,
            step.since_sequence,
            step.state,
            step.at
        )?;
    }
    Ok(0)
}

/// Print every record of a batch.
pub fn run_history(
    args: &BatchArgs,
    chain: &PharmaChain,
    json: bool,
    out: &mut impl Write,
) -> Result<u8> {
    let history = chain.history(args.batch)?;
    if json {
        let records: Vec<_> = history.collect();
        write_json(out, &records)?;
        return Ok(0);
    }
    writeln!(out, "History of {} ({} records):", args.batch, history.len())?;
    for record in history {
        let body = &record.body;
        write!(
            out,
            "  #{:<3} {}  {:<8} by {} ({}) -> {:<13} custodian {}",
            body.sequence,
            body.timestamp,
            body.action,
            short(&body.actor),
            body.actor_role,
            body.resulting_state,
            short(&body.custodian),
        )?;
        if let Some(metadata) = &body.metadata {
            write!(out, "  [{metadata}]")?;
        }
        writeln!(out)?;
    }
    Ok(0)
}

#[derive(Serialize)]
struct StatusLine<'a> {
    batch_id: BatchId,
    product: &'a pharma_ledger::ProductDescriptor,
    projection: pharma_state::Projection,
}

/// Show the current projection of one batch or all of them.
pub fn run_status(
    args: &StatusArgs,
    chain: &PharmaChain,
    json: bool,
    out: &mut impl Write,
) -> Result<u8> {
    let batches: Vec<_> = match args.batch {
        Some(id) => vec![chain.ledger().batch(id)?],
        None => chain.ledger().batches().collect(),
    };

    if json {
        let lines: Vec<StatusLine<'_>> = batches
            .iter()
            .map(|b| StatusLine {
                batch_id: b.id(),
                product: b.product(),
                projection: b.projection(),
            })
            .collect();
        write_json(out, &lines)?;
        return Ok(0);
    }

    for batch in &batches {
        let p = batch.projection();
        writeln!(
            out,
            "{:<10} {:<13} seq={:<3} custodian={}  {} ({}, qty {})",
            batch.id().to_string(),
            p.state,
            p.last_sequence,
            short(&p.custodian),
            batch.product().name,
            batch.product().formulation,
            batch.product().quantity,
        )?;
    }
    if args.batch.is_none() {
        writeln!(out, "Total: {} batches", batches.len())?;
    }
    Ok(0)
}
