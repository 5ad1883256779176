use crate::error::{PirError, Result};
use crate::fhe::fhe::FHEScheme;
use crate::pir::accountant::NoiseAccountant;
use crate::pir::database::{side_length, Database, EncodedDatabase};
use crate::pir::linear::retrieve_linear;
use crate::pir::matrix::{retrieve_matrix, MatrixEngineConfig};
use crate::pir::selection::{build_one_hot, build_row_and_column};
use crate::pir::verify::verify;
use log::info;
use rand_chacha::ChaCha20Rng;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct TimeStat {
    name: &'static str,
    time: Duration,
}

impl TimeStat {
    fn new(name: &'static str, time: Duration) -> Self {
        Self { name, time }
    }
}

#[derive(Debug, Default)]
pub struct TimeStats {
    time_stats: Vec<TimeStat>,
}

impl TimeStats {
    pub fn add(&mut self, name: &'static str, time: Duration) {
        self.time_stats.push(TimeStat::new(name, time));
    }

    pub fn new() -> Self {
        Self {
            time_stats: Vec::new(),
        }
    }

    pub fn total(&self) -> Duration {
        self.time_stats
            .iter()
            .fold(Duration::new(0, 0), |acc, x| acc + x.time)
    }

    pub fn as_vec(&self) -> Vec<(&'static str, Duration)> {
        self.time_stats.iter().map(|x| (x.name, x.time)).collect()
    }
}

impl Display for TimeStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, time_stat) in self.time_stats.iter().enumerate() {
            write!(f, "{}: {:?}", time_stat.name, time_stat.time)?;
            if i < self.time_stats.len() - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

fn add_time(time_stats: &mut Option<&mut TimeStats>, name: &'static str, begin: Instant) {
    if let Some(stats) = time_stats {
        stats.add(name, Instant::now() - begin);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RetrievalStrategy {
    /// One selection vector of length `n`, one plaintext level.
    #[default]
    Linear,
    /// Two selection vectors of length `sqrt(n)`, an extra ciphertext level.
    Matrix,
}

impl Display for RetrievalStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalStrategy::Linear => write!(f, "linear"),
            RetrievalStrategy::Matrix => write!(f, "matrix"),
        }
    }
}

impl FromStr for RetrievalStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "vector" => Ok(RetrievalStrategy::Linear),
            "matrix" | "sqrt" => Ok(RetrievalStrategy::Matrix),
            _ => Err(format!(
                "unknown strategy '{}' (expected linear or matrix)",
                s
            )),
        }
    }
}

/// The client's encrypted request.
#[derive(Debug, Clone)]
pub enum Query<C> {
    Linear { selection: Vec<C> },
    Matrix { column: Vec<C>, row: Vec<C> },
}

impl<C> Query<C> {
    pub fn strategy(&self) -> RetrievalStrategy {
        match self {
            Query::Linear { .. } => RetrievalStrategy::Linear,
            Query::Matrix { .. } => RetrievalStrategy::Matrix,
        }
    }

    /// Number of ciphertexts sent to the server.
    pub fn num_ciphertexts(&self) -> usize {
        match self {
            Query::Linear { selection } => selection.len(),
            Query::Matrix { column, row } => column.len() + row.len(),
        }
    }
}

/// Holds the secret key. Knows the index it asks for but never the unselected entries.
pub struct PirClient<'a, S: FHEScheme> {
    scheme: &'a S,
    sk: S::SecretKey,
    rng: ChaCha20Rng,
}

impl<'a, S: FHEScheme> PirClient<'a, S> {
    pub fn new(scheme: &'a S, mut rng: ChaCha20Rng) -> Self {
        let sk = scheme.keygen(&mut rng);
        Self { scheme, sk, rng }
    }

    pub fn secret_key(&self) -> &S::SecretKey {
        &self.sk
    }

    /// Key material the server needs for relinearization.
    pub fn relin_key(&mut self) -> S::RelinKey {
        self.scheme.relin_keygen(&self.sk, &mut self.rng)
    }

    /// Builds the query for `index` into a database of `db_len` entries. For the matrix strategy a
    /// non-square `db_len` is rejected before anything is encrypted.
    pub fn query(
        &mut self,
        strategy: RetrievalStrategy,
        index: usize,
        db_len: usize,
        mut time_stats: Option<&mut TimeStats>,
    ) -> Result<Query<S::Ciphertext>> {
        let begin = Instant::now();
        let query = match strategy {
            RetrievalStrategy::Linear => Query::Linear {
                selection: build_one_hot(self.scheme, &self.sk, db_len, index, &mut self.rng)?,
            },
            RetrievalStrategy::Matrix => {
                let v = side_length(db_len)?;
                let (column, row) =
                    build_row_and_column(self.scheme, &self.sk, v, index, &mut self.rng)?;
                Query::Matrix { column, row }
            }
        };
        add_time(&mut time_stats, "query", begin);
        Ok(query)
    }

    pub fn accountant(&self) -> NoiseAccountant<'_, S> {
        NoiseAccountant::new(self.scheme, &self.sk)
    }

    pub fn extract(&self, response: &S::Ciphertext) -> u64 {
        self.scheme.decode(&self.scheme.decrypt(&self.sk, response))
    }

    pub fn verify(&self, response: &S::Ciphertext, expected: u64) -> Result<u64> {
        verify(self.scheme, &self.sk, response, expected)
    }

    pub fn noise_budget_bits(&self, ct: &S::Ciphertext) -> u32 {
        self.scheme.noise_budget_bits(&self.sk, ct)
    }
}

/// Holds the encoded database and the relinearization key. Never sees the index.
pub struct PirServer<'a, S: FHEScheme> {
    scheme: &'a S,
    db: EncodedDatabase<S>,
    rk: S::RelinKey,
    config: MatrixEngineConfig,
}

impl<'a, S: FHEScheme> PirServer<'a, S> {
    pub fn new(
        scheme: &'a S,
        db: &Database,
        rk: S::RelinKey,
        config: MatrixEngineConfig,
        mut time_stats: Option<&mut TimeStats>,
    ) -> Result<Self> {
        if db.plaintext_modulus() != scheme.plaintext_modulus() {
            return Err(PirError::config(format!(
                "database holds values mod {} but the scheme encodes mod {}",
                db.plaintext_modulus(),
                scheme.plaintext_modulus()
            )));
        }
        let begin = Instant::now();
        let db = EncodedDatabase::encode(scheme, db);
        add_time(&mut time_stats, "encode", begin);
        Ok(Self {
            scheme,
            db,
            rk,
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Runs the engine matching the query's strategy.
    pub fn answer(
        &self,
        query: &Query<S::Ciphertext>,
        accountant: Option<&mut NoiseAccountant<'_, S>>,
        mut time_stats: Option<&mut TimeStats>,
    ) -> Result<S::Ciphertext> {
        let begin = Instant::now();
        let response = match query {
            Query::Linear { selection } => {
                retrieve_linear(self.scheme, self.db.entries(), selection, accountant)?
            }
            Query::Matrix { column, row } => {
                let rows = self.db.rows()?;
                retrieve_matrix(
                    self.scheme,
                    &rows,
                    column,
                    row,
                    &self.rk,
                    self.config,
                    accountant,
                )?
            }
        };
        info!(
            "answered {} query over {} entries in {:?}",
            query.strategy(),
            self.db.len(),
            Instant::now() - begin
        );
        add_time(&mut time_stats, "answer", begin);
        Ok(response)
    }
}
