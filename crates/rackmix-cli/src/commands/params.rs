//! Host parameter table listing.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use super::LayoutArgs;
use clap::Args;
use rackmix_core::ParamDescriptor;
use rackmix_mixer::ParamMap;

#[derive(Args)]
pub struct ParamsArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    /// Only show parameters whose label contains this text
    #[arg(long)]
    filter: Option<String>,
}

fn format_value(d: &ParamDescriptor, v: f32) -> String {
    if d.stepped {
        format!("{v:.0}{}", d.unit.suffix())
    } else {
        format!("{v:.3}{}", d.unit.suffix())
    }
}

/// One table row per parameter: `(index, label, descriptor)`.
pub fn rows(
    map: &ParamMap,
    descriptors: &[ParamDescriptor],
) -> Vec<(usize, String, ParamDescriptor)> {
    descriptors
        .iter()
        .enumerate()
        .map(|(i, d)| (i, map.label(i).unwrap_or(d.name).to_string(), *d))
        .collect()
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let layout = args.layout.to_layout()?;
    let (bank, map) = ParamMap::build(&layout)?;

    println!(
        "Parameters for {} tracks, {} groups, {} aux returns ({} slots)",
        layout.tracks,
        layout.groups,
        layout.auxes,
        bank.len()
    );
    println!();
    println!(
        "  {:>5}  {:24}  {:>10}  {:>10}  {:>10}",
        "Index", "Label", "Min", "Max", "Default"
    );
    println!(
        "  {:>5}  {:24}  {:>10}  {:>10}  {:>10}",
        "-----", "-----", "---", "---", "-------"
    );

    let needle = args.filter.as_deref().map(str::to_lowercase);
    let mut shown = 0;
    for (i, label, d) in rows(&map, bank.descriptors()) {
        if let Some(n) = &needle
            && !label.to_lowercase().contains(n.as_str())
        {
            continue;
        }
        println!(
            "  {:>5}  {:24}  {:>10}  {:>10}  {:>10}",
            i,
            label,
            format_value(&d, d.min),
            format_value(&d, d.max),
            format_value(&d, d.default)
        );
        shown += 1;
    }

    if needle.is_some() {
        println!();
        println!("{shown} of {} parameters shown", bank.len());
    }

    Ok(())
}
