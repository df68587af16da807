use anyhow::{anyhow, Result};

use crate::types::DEFAULT_PAIR_COUNT;

/// Upper bound on pairs; the console board shows two-digit positions.
pub const MAX_PAIRS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Play { pairs: usize, seed: Option<u64> },
    Login { username: String, password: String },
    Logout,
    Leaderboard,
}

pub fn parse_args(args: &[String]) -> Result<CliCommand> {
    match args.first().map(String::as_str) {
        None | Some("play") => parse_play(args.get(1..).unwrap_or(&[])),
        Some(flag) if flag.starts_with("--") => parse_play(args),
        Some("login") => {
            let username = args
                .get(1)
                .ok_or_else(|| anyhow!("login: missing username"))?;
            let password = args
                .get(2)
                .ok_or_else(|| anyhow!("login: missing password"))?;
            if args.len() > 3 {
                return Err(anyhow!("login: unexpected argument: {}", args[3]));
            }
            Ok(CliCommand::Login {
                username: username.clone(),
                password: password.clone(),
            })
        }
        Some("logout") => Ok(CliCommand::Logout),
        Some("leaderboard") => Ok(CliCommand::Leaderboard),
        Some(other) => Err(anyhow!("unknown command: {}", other)),
    }
}

fn parse_play(args: &[String]) -> Result<CliCommand> {
    let mut pairs = DEFAULT_PAIR_COUNT;
    let mut seed = None;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--pairs" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("play: missing value for --pairs"))?;
                pairs = v
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=MAX_PAIRS).contains(n))
                    .ok_or_else(|| anyhow!("play: --pairs must be 1..={}: {}", MAX_PAIRS, v))?;
            }
            "--seed" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("play: missing value for --seed"))?;
                seed = Some(
                    v.parse::<u64>()
                        .map_err(|_| anyhow!("play: invalid --seed value: {}", v))?,
                );
            }
            other => return Err(anyhow!("play: unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(CliCommand::Play { pairs, seed })
}
