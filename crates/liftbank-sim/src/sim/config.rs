use anyhow::{Context, bail};
use clap::Parser;
use core::{ops::Range, time::Duration};
use liftbank::{
    BankConfig, CallRequest, DEFAULT_NUM_CARS, DEFAULT_NUM_FLOORS, FloorIndex, RequestGenerator,
};

/// Runtime configuration for the `liftbank-sim` binary.
///
/// Every value can be given as a flag or as an environment variable (a `.env`
/// file in the working directory is loaded first). The defaults describe a
/// three-car, ten-floor building with a new random call every one to four
/// seconds.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "liftbank-sim",
    version,
    about = "Simulate a bank of elevator cars serving random and scripted calls"
)]
pub struct CliArgs {
    /// Number of cars in the bank. Each car gets its own worker task.
    ///
    /// Environment variable: `NUM_CARS`
    #[arg(long, env = "NUM_CARS", default_value_t = DEFAULT_NUM_CARS)]
    pub num_cars: usize,

    /// Number of floors in the building, numbered from 1.
    ///
    /// Environment variable: `NUM_FLOORS`
    #[arg(long, env = "NUM_FLOORS", default_value_t = DEFAULT_NUM_FLOORS)]
    pub num_floors: FloorIndex,

    /// Milliseconds for a car to travel a single floor.
    ///
    /// Environment variable: `FLOOR_TICK_MS`
    #[arg(long, env = "FLOOR_TICK_MS", default_value_t = 500)]
    pub floor_tick_ms: u64,

    /// Milliseconds an idle car waits on the dispatch channel before checking
    /// again. Also bounds how long an idle car takes to notice shutdown.
    ///
    /// Environment variable: `POLL_TIMEOUT_MS`
    #[arg(long, env = "POLL_TIMEOUT_MS", default_value_t = 500)]
    pub poll_timeout_ms: u64,

    /// Shortest pause between generated calls, in milliseconds (inclusive).
    ///
    /// Environment variable: `MIN_CALL_INTERVAL_MS`
    #[arg(long, env = "MIN_CALL_INTERVAL_MS", default_value_t = 1000)]
    pub min_call_interval_ms: u64,

    /// Longest pause between generated calls, in milliseconds (exclusive).
    ///
    /// Environment variable: `MAX_CALL_INTERVAL_MS`
    #[arg(long, env = "MAX_CALL_INTERVAL_MS", default_value_t = 4000)]
    pub max_call_interval_ms: u64,

    /// Seconds to wait for each car to stop during shutdown before aborting
    /// its worker.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Seed for the call generator. The same seed replays the same traffic.
    ///
    /// Environment variable: `SEED`
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,

    /// A call to place at startup, as `FROM:TO`. May be repeated.
    ///
    /// Example: `--call 1:10 --call 7:3`
    #[arg(long = "call", value_name = "FROM:TO", value_parser = parse_call)]
    pub calls: Vec<(FloorIndex, FloorIndex)>,

    /// Do not generate random calls; only the scripted ones are served.
    ///
    /// Environment variable: `NO_GENERATOR`
    #[arg(long, env = "NO_GENERATOR", default_value_t = false)]
    pub no_generator: bool,

    /// Stop on our own after this many seconds instead of waiting for Ctrl+C.
    ///
    /// Environment variable: `RUN_FOR`
    #[arg(long, env = "RUN_FOR")]
    pub run_for: Option<u64>,
}

fn parse_call(value: &str) -> Result<(FloorIndex, FloorIndex), String> {
    let (from, to) = value
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got `{value}`"))?;
    let from = from
        .trim()
        .parse()
        .map_err(|e| format!("bad origin floor `{from}`: {e}"))?;
    let to = to
        .trim()
        .parse()
        .map_err(|e| format!("bad destination floor `{to}`: {e}"))?;
    Ok((from, to))
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub bank: BankConfig,
    pub call_interval: Range<Duration>,
    pub seed: Option<u64>,
    pub calls: Vec<CallRequest>,
    pub generate: bool,
    pub run_for: Option<Duration>,
}

impl SimConfig {
    /// Builds the random call source, or `None` if generation is disabled.
    pub fn generator(&self) -> anyhow::Result<Option<RequestGenerator>> {
        if !self.generate {
            return Ok(None);
        }
        let generator =
            RequestGenerator::new(self.bank.num_floors, self.call_interval.clone(), self.seed)?;
        Ok(Some(generator))
    }
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let bank = BankConfig {
            num_cars: args.num_cars,
            num_floors: args.num_floors,
            floor_tick: Duration::from_millis(args.floor_tick_ms),
            poll_timeout: Duration::from_millis(args.poll_timeout_ms),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
        };
        bank.validate()?;

        if args.min_call_interval_ms >= args.max_call_interval_ms {
            bail!(
                "MIN_CALL_INTERVAL_MS ({}) must be less than MAX_CALL_INTERVAL_MS ({})",
                args.min_call_interval_ms,
                args.max_call_interval_ms
            );
        }

        if args.no_generator && args.calls.is_empty() {
            bail!("NO_GENERATOR is set but no --call was given; there is nothing to simulate");
        }

        if args.run_for == Some(0) {
            bail!("RUN_FOR must be greater than 0");
        }

        let calls = args
            .calls
            .iter()
            .map(|&(from, to)| {
                CallRequest::new(from, to, bank.num_floors)
                    .with_context(|| format!("invalid --call {from}:{to}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            bank,
            call_interval: Duration::from_millis(args.min_call_interval_ms)
                ..Duration::from_millis(args.max_call_interval_ms),
            seed: args.seed,
            calls,
            generate: !args.no_generator,
            run_for: args.run_for.map(Duration::from_secs),
        })
    }
}
