use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Arg, Command};
use primitive_types::H160;

use crowdsale::{days, ether, ManualClock, SaleConfig, SaleEngine};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let matches = Command::new("crowdsale-cli")
        .version(crowdsale::VERSION)
        .about("Token crowdsale demo")
        .subcommand(
            Command::new("simulate")
                .about("Deploy a sale and play a scripted scenario against a manual clock")
                .arg(
                    Arg::new("goal")
                        .long("goal")
                        .help("Hard cap in ether")
                        .default_value("8"),
                )
                .arg(
                    Arg::new("duration-days")
                        .long("duration-days")
                        .help("Sale window length in days")
                        .default_value("20"),
                )
                .arg(
                    Arg::new("owner")
                        .long("owner")
                        .help("Owner address (hex)")
                        .default_value("0x00000000000000000000000000000000000000a1"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("simulate", sub)) => {
            let goal: u64 = sub
                .get_one::<String>("goal")
                .expect("defaulted")
                .parse()
                .context("--goal must be a whole number of ether")?;
            let duration: u64 = sub
                .get_one::<String>("duration-days")
                .expect("defaulted")
                .parse()
                .context("--duration-days must be a whole number of days")?;
            let owner = parse_address(sub.get_one::<String>("owner").expect("defaulted"))?;
            simulate(goal, duration, owner)
        }
        _ => {
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn parse_address(input: &str) -> anyhow::Result<H160> {
    let hex_clean = input.strip_prefix("0x").unwrap_or(input);
    if hex_clean.len() != 40 {
        bail!("address must be 20 bytes of hex, got {:?}", input);
    }
    let bytes = hex::decode(hex_clean).context("address is not valid hex")?;
    Ok(H160::from_slice(&bytes))
}

fn simulate(goal_ether: u64, duration_days: u64, owner: H160) -> anyhow::Result<()> {
    let start = 1_700_000_000u64;
    let wallet = H160::from_low_u64_be(0xa10);
    let wallet_team = H160::from_low_u64_be(0xa11);
    let wallet_advisor = H160::from_low_u64_be(0xa12);
    let investor_early = H160::from_low_u64_be(0xb01);
    let investor_late = H160::from_low_u64_be(0xb02);
    let grantee = H160::from_low_u64_be(0xc01);

    let config = SaleConfig {
        start_time: start,
        end_time: start + days(duration_days),
        wallet,
        wallet_team,
        wallet_advisor,
        goal: ether(goal_ether),
    };

    let clock = Arc::new(ManualClock::new(start - days(1)));
    let engine = SaleEngine::deploy(owner, config, clock.clone())?;

    // deployment handshake: the sale must own the ledger before it can mint
    engine.transfer_token_ownership_to_sale(owner)?;
    engine.claim_token_ownership(owner)?;
    println!("deployed; token owner is now {:?}", engine.token_owner());

    clock.set(start);
    println!("day 0, rate {}", engine.rate());
    engine.contribute(investor_early, ether(1))?;
    engine.add_update_grantee(owner, grantee, ether(1))?;

    clock.set(start + days(1));
    println!("day 1, rate {}", engine.rate());
    engine.contribute(investor_late, ether(2))?;
    engine.set_fiat_raised_converted_to_wei(owner, ether(1))?;

    clock.set(start + days(duration_days));
    println!(
        "window closed, phase {:?}, raised {} wei",
        engine.phase(),
        engine.total_funds_raised()
    );

    engine.finalize(owner)?;
    engine.token_claim_ownership(owner)?;

    println!("finalized; total supply {}", engine.token_total_supply());
    println!("team balance     {}", engine.balance_of(wallet_team));
    println!("advisor balance  {}", engine.balance_of(wallet_advisor));
    println!("grantee balance  {}", engine.balance_of(grantee));

    println!("-- event log --");
    for event in engine.events() {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}
