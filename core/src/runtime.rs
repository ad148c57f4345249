use rayon::ThreadPoolBuilder;
use std::env;
use std::sync::OnceLock;

use crate::{Error, Result};

const CPU_THREADS_ENV: &str = "CV_CPU_THREADS";

static THREAD_POOL_INIT: OnceLock<std::result::Result<usize, String>> = OnceLock::new();

/// Initialize the global Rayon thread pool used by the row-parallel normal loop.
///
/// Priority:
/// 1. `num_threads` argument
/// 2. `CV_CPU_THREADS` environment variable
/// 3. Rayon default
///
/// Only the first call configures the pool; later calls return the first result.
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<usize> {
    let res = THREAD_POOL_INIT.get_or_init(|| {
        let threads = match num_threads {
            Some(n) => Some(check_thread_count(n)?),
            None => read_cpu_threads_from_env()?,
        };

        let mut builder = ThreadPoolBuilder::new();
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        builder.build_global().map_err(|e| e.to_string())?;

        let threads = rayon::current_num_threads();
        tracing::debug!(threads, "initialized global thread pool");
        Ok(threads)
    });
    res.clone().map_err(Error::RuntimeError)
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn check_thread_count(n: usize) -> std::result::Result<usize, String> {
    if n == 0 {
        return Err(format!("{CPU_THREADS_ENV} must be >= 1"));
    }
    Ok(n)
}

/// Parse a thread count as given in `CV_CPU_THREADS`.
fn parse_cpu_threads(raw: &str) -> std::result::Result<usize, String> {
    let n = raw
        .trim()
        .parse()
        .map_err(|_| format!("{CPU_THREADS_ENV} must be a positive integer, got '{raw}'"))?;
    check_thread_count(n)
}

fn read_cpu_threads_from_env() -> std::result::Result<Option<usize>, String> {
    match env::var(CPU_THREADS_ENV) {
        Ok(raw) => parse_cpu_threads(&raw).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("failed to read {CPU_THREADS_ENV}: {e}")),
    }
}
