//! Console Memory Match runner (default binary).
//!
//! Plays a round on stdin/stdout. The round driver owns the board and its
//! timers; this loop only forwards input, prints what changed, and hands
//! finished runs to the remote bridge.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use memory_match::adapter::{
    RemoteBridge, RemoteEvent, RemoteServices, ServiceConfig, SkipReason, SubmitOutcome,
};
use memory_match::cli::{parse_args, CliCommand};
use memory_match::console::{content_refs, parse_input, render_board, ConsoleInput, HELP};
use memory_match::core::build_deck;
use memory_match::engine::{spawn_round, DriverConfig, RoundEvent, RoundHandle};
use memory_match::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    let config = ServiceConfig::from_env();
    let services = RemoteServices::from_config(&config).context("starting remote services")?;

    match command {
        CliCommand::Login { username, password } => {
            let outcome = services.auth.login(&username, &password).await?;
            println!(
                "Signed in as {}{}",
                outcome.username,
                if outcome.is_paid { " (paid)" } else { "" }
            );
            Ok(())
        }
        CliCommand::Logout => {
            services.auth.logout()?;
            println!("Signed out.");
            Ok(())
        }
        CliCommand::Leaderboard => {
            let reconciliation = services.reconciler.reconcile_stored().await;
            print!("{}", reconciliation.view);
            Ok(())
        }
        CliCommand::Play { pairs, seed } => play(services, pairs, seed).await,
    }
}

async fn play(services: RemoteServices, pairs: usize, seed: Option<u64>) -> Result<()> {
    let refs = content_refs(pairs);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut bridge = RemoteBridge::new(services);
    let (handle, mut events, driver_task) = spawn_round(DriverConfig::default());

    let generation = handle.start(build_deck(&refs, &mut rng)?).await?;
    bridge.begin_round(generation);
    info!(pairs, generation, "round dealt");
    println!("{HELP}");
    print_board(&handle).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_request = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    None => {}
                    Some(ConsoleInput::Quit) => break,
                    Some(ConsoleInput::Help) => println!("{HELP}"),
                    Some(ConsoleInput::Unknown(text)) => println!("Unknown command: {text}"),
                    Some(ConsoleInput::Select(position)) => {
                        if let Err(err) = handle.select(position).await {
                            println!("{err}");
                        }
                    }
                    Some(ConsoleInput::Restart) => {
                        let generation = handle.restart(build_deck(&refs, &mut rng)?).await?;
                        bridge.begin_round(generation);
                        print_board(&handle).await?;
                    }
                    Some(ConsoleInput::Leaderboard) => {
                        last_request = Some(bridge.request_leaderboard());
                    }
                }
            }
            Some(event) = events.recv() => match event {
                RoundEvent::TileRevealed { .. }
                | RoundEvent::PairMatched { .. }
                | RoundEvent::PairHidden { .. } => print_board(&handle).await?,
                RoundEvent::Completed(result) => {
                    print_board(&handle).await?;
                    match bridge.round_complete(result.elapsed_seconds) {
                        Ok(run) => println!("Finished in {}s as {}.", run.seconds, run.username),
                        Err(err) => warn!(error = %err, "could not record run"),
                    }
                    last_request = Some(bridge.request_leaderboard());
                }
                RoundEvent::Tick { elapsed_seconds } => debug!(elapsed_seconds, "tick"),
                RoundEvent::Started { .. } | RoundEvent::Reset => {}
            },
            Some(remote) = bridge.recv() => match remote {
                RemoteEvent::Submitted { outcome, .. } => match outcome {
                    SubmitOutcome::Accepted { .. } => println!("Score submitted."),
                    SubmitOutcome::Skipped(SkipReason::SignedOut) => {
                        println!("Score saved locally (not signed in).")
                    }
                    SubmitOutcome::Skipped(SkipReason::Offline) => {
                        println!("Score saved locally (offline mode).")
                    }
                    SubmitOutcome::Rejected { code } => println!("Score rejected by server ({code})."),
                    SubmitOutcome::Failed(err) => println!("Score not submitted: {err}"),
                },
                RemoteEvent::LeaderboardFetched { request_id, pending, outcome } => {
                    // Only the latest request is shown; older ones leave the run pending.
                    if last_request == Some(request_id) {
                        let reconciliation = bridge.settle(pending, outcome);
                        print!("{}", reconciliation.view);
                    }
                }
            },
        }
    }

    bridge.shutdown();
    drop(handle);
    let _ = driver_task.await;
    Ok(())
}

async fn print_board(handle: &RoundHandle) -> Result<()> {
    let snapshot = handle.snapshot().await?;
    print!("{}", render_board(&snapshot));
    Ok(())
}
