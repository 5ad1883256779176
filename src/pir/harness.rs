use crate::error::{PirError, Result};
use crate::fhe::bfv::BfvContext;
use crate::fhe::fhe::FHEScheme;
use crate::params::ParameterProfile;
use crate::pir::accountant::RelinearizationPolicy;
use crate::pir::database::Database;
use crate::pir::matrix::MatrixEngineConfig;
use crate::pir::pir::{PirClient, PirServer, RetrievalStrategy, TimeStats};
use crate::pir::selection::checked_index;
use clap::{Parser, ValueEnum};
use itertools::Itertools;
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProfileArg {
    Original,
    Default,
    Shallow,
    Deep,
}

impl ProfileArg {
    pub fn profile(self) -> ParameterProfile {
        match self {
            ProfileArg::Original => ParameterProfile::ORIGINAL,
            ProfileArg::Default => ParameterProfile::DEFAULT_2048,
            ProfileArg::Shallow => ParameterProfile::SHALLOW_1024,
            ProfileArg::Deep => ParameterProfile::DEEP_4096,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Privately retrieve one entry of a random database")]
pub struct Args {
    /// Retrieval strategy (linear or matrix)
    #[arg(long)]
    pub strategy: Option<RetrievalStrategy>,

    /// Number of database entries
    #[arg(long, default_value_t = 100)]
    pub size: usize,

    /// Index to retrieve; read from standard input when absent
    #[arg(long, allow_negative_numbers = true)]
    pub index: Option<i64>,

    /// Relinearization policy for matrix retrieval (never, each, final or auto)
    #[arg(long, default_value_t = RelinearizationPolicy::Auto)]
    pub relin: RelinearizationPolicy,

    #[arg(long, value_enum, default_value_t = ProfileArg::Original)]
    pub profile: ProfileArg,

    /// Seed for the database and key generation; random when absent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of retrievals; trials after the first use random indices
    #[arg(long, default_value_t = 1)]
    pub trials: usize,
}

pub struct TrialResult {
    pub index: usize,
    pub value: u64,
    pub response_bytes: usize,
    pub noise_budget_bits: u32,
    pub min_step_budget_bits: Option<u32>,
    pub time_stats: TimeStats,
}

#[macro_export]
macro_rules! generate_main {
    () => {
        fn main() {
            std::process::exit($crate::pir::harness::harness_main(None));
        }
    };
    ($strategy: expr) => {
        fn main() {
            std::process::exit($crate::pir::harness::harness_main(Some($strategy)));
        }
    };
}

fn prompt_index(len: usize) -> Result<i64> {
    print!("Enter an index in [0, {}): ", len);
    io::stdout()
        .flush()
        .map_err(|e| PirError::config(format!("could not write prompt: {}", e)))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| PirError::config(format!("could not read index: {}", e)))?;
    line.trim()
        .parse::<i64>()
        .map_err(|_| PirError::config(format!("'{}' is not an index", line.trim())))
}

/// Runs one query against `server` and verifies the answer against the cleartext database.
pub fn run_trial(
    client: &mut PirClient<'_, BfvContext>,
    server: &PirServer<'_, BfvContext>,
    db: &Database,
    strategy: RetrievalStrategy,
    index: usize,
) -> Result<TrialResult> {
    let mut time_stats = TimeStats::new();
    let query = client.query(strategy, index, db.len(), Some(&mut time_stats))?;
    info!("query holds {} ciphertexts", query.num_ciphertexts());

    let mut accountant = client.accountant();
    let response = server.answer(&query, Some(&mut accountant), Some(&mut time_stats))?;
    for reading in accountant.history() {
        info!(
            "measured noise {}: {} bits (size {})",
            reading.step, reading.noise_budget_bits, reading.size
        );
    }

    let begin = Instant::now();
    let noise_budget_bits = client.noise_budget_bits(&response);
    let value = client.verify(&response, db.get(index)?)?;
    time_stats.add("extract", Instant::now() - begin);

    Ok(TrialResult {
        index,
        value,
        response_bytes: response.byte_len(),
        noise_budget_bits,
        min_step_budget_bits: accountant.min_budget(),
        time_stats,
    })
}

fn run(args: &Args, fixed_strategy: Option<RetrievalStrategy>) -> Result<()> {
    let strategy = match (fixed_strategy, args.strategy) {
        (Some(fixed), Some(requested)) if fixed != requested => {
            warn!("ignoring --strategy {}, this binary always uses {}", requested, fixed);
            fixed
        }
        (Some(fixed), _) => fixed,
        (None, requested) => requested.unwrap_or_default(),
    };

    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let profile = args.profile.profile();
    let mut init_times = TimeStats::new();
    let begin = Instant::now();
    let scheme = BfvContext::new(profile)?;
    init_times.add("configure", Instant::now() - begin);
    info!("{:?}", scheme);

    let db = Database::random(args.size, scheme.plaintext_modulus(), &mut rng)?;
    if strategy == RetrievalStrategy::Matrix {
        db.side_length()?;
    }

    let index = match args.index {
        Some(index) => index,
        None => prompt_index(db.len())?,
    };
    let index = checked_index(index, db.len())?;

    let begin = Instant::now();
    let client_rng = ChaCha20Rng::from_rng(&mut rng)
        .map_err(|e| PirError::config(format!("could not seed client: {}", e)))?;
    let mut client = PirClient::new(&scheme, client_rng);
    let rk = client.relin_key();
    init_times.add("setup", Instant::now() - begin);
    let config = MatrixEngineConfig {
        relinearization: args.relin,
    };
    let server = PirServer::new(&scheme, &db, rk, config, Some(&mut init_times))?;

    println!("Strategy: {}, entries: {}, profile: {:?}", strategy, db.len(), args.profile);
    println!("Init times:");
    for (stat, value) in init_times.as_vec() {
        println!("    {}: {:?}", stat, value);
    }
    println!("========");

    let mut all_trial_times = Vec::with_capacity(args.trials);
    for trial in 0..args.trials.max(1) {
        let index = if trial == 0 {
            index
        } else {
            rng.gen_range(0..db.len())
        };
        let result = run_trial(&mut client, &server, &db, strategy, index)?;
        println!("Retrieved index {}: {}", result.index, result.value);
        println!("Response size: {} bytes", result.response_bytes);
        println!("Noise budget in response: {} bits", result.noise_budget_bits);
        if let Some(min) = result.min_step_budget_bits {
            println!("Lowest budget over all steps: {} bits", min);
        }
        println!("Trial times:");
        for (stat, value) in result.time_stats.as_vec() {
            println!("    {}: {:?}", stat, value);
        }
        println!("Trial time (total): {:?}", result.time_stats.total());
        println!("========");
        all_trial_times.push(result.time_stats);
    }

    if all_trial_times.len() > 1 {
        print_summary(&all_trial_times);
    }
    Ok(())
}

fn print_summary(all_trial_times: &[TimeStats]) {
    let trial_times = all_trial_times.iter().map(|tt| tt.as_vec()).collect_vec();
    let stat_names = trial_times[0].iter().map(|x| x.0).collect_vec();

    println!("Summary times:");
    for (stat_i, stat_name) in stat_names.iter().copied().enumerate() {
        let values = trial_times
            .iter()
            .map(|tt| tt[stat_i].1.as_nanos() as f64)
            .collect_vec();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|x| x.powi(2)).sum::<f64>() / values.len() as f64
            - mean.powi(2);
        println!(
            "    {}: {:?} mean, {:?} stddev",
            stat_name,
            Duration::from_nanos(mean.round() as u64),
            Duration::from_nanos(var.max(0.0).sqrt().round() as u64),
        );
    }
}

/// Entry point of the binaries. Returns the process exit status.
pub fn harness_main(fixed_strategy: Option<RetrievalStrategy>) -> i32 {
    env_logger::init();
    let args = Args::parse();
    match run(&args, fixed_strategy) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "vector_pir",
            "--strategy",
            "matrix",
            "--size",
            "16",
            "--index",
            "-3",
            "--relin",
            "never",
            "--profile",
            "shallow",
        ]);
        assert_eq!(args.strategy, Some(RetrievalStrategy::Matrix));
        assert_eq!(args.size, 16);
        assert_eq!(args.index, Some(-3));
        assert_eq!(args.relin, RelinearizationPolicy::Never);
        assert_eq!(args.profile, ProfileArg::Shallow);
        assert_eq!(args.trials, 1);
    }

    #[test]
    fn test_run_reports_errors() {
        let args = Args::parse_from(["vector_pir", "--size", "4", "--index", "4", "--seed", "1"]);
        assert_eq!(
            run(&args, None),
            Err(PirError::IndexOutOfRange { index: 4, len: 4 })
        );

        let args = Args::parse_from(["vector_pir", "--size", "5", "--index", "0", "--seed", "1"]);
        assert_eq!(
            run(&args, Some(RetrievalStrategy::Matrix)),
            Err(PirError::NonSquareDatabase { len: 5 })
        );
    }

    #[test]
    fn test_run_linear() {
        let args = Args::parse_from([
            "vector_pir",
            "--size",
            "9",
            "--index",
            "4",
            "--seed",
            "2",
            "--trials",
            "2",
        ]);
        assert_eq!(run(&args, None), Ok(()));
    }
}
