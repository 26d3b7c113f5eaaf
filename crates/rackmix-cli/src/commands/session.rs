//! Session file commands.
//!
//! `init` writes a session with every control at its default; `check`
//! loads one, reports values the mixer would clamp or ignore, and prints
//! a short summary of the mix.

use super::LayoutArgs;
use clap::{Args, Subcommand};
use rackmix_config::Session;
use rackmix_mixer::resolve_group;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Write a default session file
    Init {
        /// Session file to create
        file: PathBuf,

        /// Session name
        #[arg(short, long, default_value = "Untitled")]
        name: String,

        /// Description of the session
        #[arg(short, long)]
        description: Option<String>,

        /// Sample rate to run at
        #[arg(long, default_value = "48000")]
        sample_rate: u32,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a session file and summarise it
    Check {
        /// Session file to check
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(args: SessionArgs) -> anyhow::Result<()> {
    match args.command {
        SessionCommand::Init {
            file,
            name,
            description,
            sample_rate,
            layout,
            force,
        } => {
            if file.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", file.display());
            }
            let mut session = Session::new(name, layout.to_layout()?).with_sample_rate(sample_rate);
            if let Some(desc) = description {
                session = session.with_description(desc);
            }
            session.save(&file)?;
            tracing::info!(path = %file.display(), "session written");
            println!("Created {}", file.display());
            Ok(())
        }
        SessionCommand::Check { file, json } => check(&file, json),
    }
}

fn check(file: &Path, json: bool) -> anyhow::Result<()> {
    let session = Session::load(file)?;
    let issues: Vec<String> = session.issues().iter().map(ToString::to_string).collect();

    if json {
        let report = serde_json::json!({
            "valid": issues.is_empty(),
            "issues": issues,
            "summary": summarize(&session),
            "session": serde_json::from_str::<serde_json::Value>(&session.to_json()?)?,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", session.name);
        println!("{}", "=".repeat(session.name.len()));
        if let Some(desc) = &session.description {
            println!("{desc}");
        }
        println!();
        for line in summarize(&session) {
            println!("  {line}");
        }
        println!();
        if issues.is_empty() {
            println!("No issues found.");
        } else {
            println!("Issues:");
            for issue in &issues {
                println!("  - {issue}");
            }
        }
    }

    if !issues.is_empty() {
        anyhow::bail!("{} issue(s) in {}", issues.len(), file.display());
    }
    Ok(())
}

/// Human-readable overview of a session's mix.
pub fn summarize(session: &Session) -> Vec<String> {
    let layout = session.layout;
    let state = &session.state;
    let mut lines = vec![
        format!(
            "Layout: {} tracks, {} groups, {} aux returns",
            layout.tracks, layout.groups, layout.auxes
        ),
        format!("Sample rate: {} Hz", session.sample_rate),
    ];

    let muted = state.tracks.iter().filter(|t| t.mute).count()
        + state.groups.iter().chain(&state.auxes).filter(|s| s.mute).count();
    let soloed = state.tracks.iter().filter(|t| t.solo).count()
        + state.groups.iter().filter(|s| s.solo).count();
    let aux_soloed = state.auxes.iter().filter(|s| s.solo).count();
    lines.push(format!("Muted: {muted}, soloed: {soloed}, aux solos: {aux_soloed}"));

    for g in 0..layout.groups {
        let members: Vec<String> = state
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| resolve_group(t.group as f32, layout.groups) == Some(g))
            .map(|(i, _)| (i + 1).to_string())
            .collect();
        if !members.is_empty() {
            lines.push(format!("Group {}: tracks {}", g + 1, members.join(", ")));
        }
    }

    let links = state.global.link_bit_mask.count_ones();
    if links > 0 {
        lines.push(format!("Linked faders: {links}"));
    }

    let m = &state.master;
    let mut master = format!("Master: fader {:.2}", m.fader);
    for (on, label) in [(m.mute, "muted"), (m.dim, "dimmed"), (m.mono, "mono")] {
        if on {
            master.push_str(", ");
            master.push_str(label);
        }
    }
    lines.push(master);
    lines
}
