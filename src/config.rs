//! Server settings and solver parameters.

use std::time::Duration;
use clap::Parser;
use num_traits::{Float, Num};
use totsu::prelude::SolverParam;

/// Server settings, from command line flags or `CVXBALL_*` environment variables.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "cvxball-server", version, about = "Minimum enclosing ball compute server")]
pub struct ServerConfig
{
    /// Address to bind.
    #[arg(long, env = "CVXBALL_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, env = "CVXBALL_PORT", default_value_t = 5008)]
    pub port: u16,

    /// Upper limit of a single solve in seconds, no limit if absent.
    #[arg(long, env = "CVXBALL_SOLVE_TIMEOUT_SECS")]
    pub solve_timeout_secs: Option<u64>,

    /// Age in seconds after which a staged upload is dropped.
    #[arg(long, env = "CVXBALL_STALE_AFTER_SECS", default_value_t = 600)]
    pub stale_after_secs: u64,

    /// Period in seconds of the stale upload sweep.
    #[arg(long, env = "CVXBALL_SWEEP_PERIOD_SECS", default_value_t = 60)]
    pub sweep_period_secs: u64,

    /// Maximum number of concurrent connections.
    #[arg(long, env = "CVXBALL_MAX_CONNECTIONS", default_value_t = 64)]
    pub max_connections: usize,

    /// Maximum number of solves running at once, timed out ones included.
    #[arg(long, env = "CVXBALL_MAX_SOLVES", default_value_t = 4)]
    pub max_solves: usize,

    /// Maximum length in bytes of one request line.
    #[arg(long, env = "CVXBALL_MAX_LINE_BYTES", default_value_t = 64 * 1024 * 1024)]
    pub max_line_bytes: usize,
}

impl Default for ServerConfig
{
    fn default() -> Self
    {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 5008,
            solve_timeout_secs: None,
            stale_after_secs: 600,
            sweep_period_secs: 60,
            max_connections: 64,
            max_solves: 4,
            max_line_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ServerConfig
{
    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String
    {
        format!("{}:{}", self.host, self.port)
    }

    pub fn solve_timeout(&self) -> Option<Duration>
    {
        self.solve_timeout_secs.map(Duration::from_secs)
    }

    pub fn stale_after(&self) -> Duration
    {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn sweep_period(&self) -> Duration
    {
        Duration::from_secs(self.sweep_period_secs.max(1))
    }
}

//

/// Reads a number from the environment variable `e`.
///
/// Returns `None` if the variable is unset or does not parse.
pub fn num_by_env<N: Num + std::fmt::Display>(e: &str) -> Option<N>
{
    if let Some(v) = std::env::var(e).ok()
                     .and_then(|s| N::from_str_radix(s.trim(), 10).ok()) {
        log::info!("{}: {}", e, v);
        Some(v)
    }
    else {
        None
    }
}

/// Overrides solver parameters by `CVXBALL_MAX_ITER`, `CVXBALL_EPS_ACC`, `CVXBALL_EPS_INF`,
/// `CVXBALL_EPS_ZERO` and `CVXBALL_LOG_PERIOD`.
pub fn set_par_by_env<F: Float + std::fmt::Display>(p: &mut SolverParam<F>)
{
    p.max_iter = num_by_env("CVXBALL_MAX_ITER").or(p.max_iter);
    p.eps_acc = num_by_env("CVXBALL_EPS_ACC").unwrap_or(p.eps_acc);
    p.eps_inf = num_by_env("CVXBALL_EPS_INF").unwrap_or(p.eps_inf);
    p.eps_zero = num_by_env("CVXBALL_EPS_ZERO").unwrap_or(p.eps_zero);
    p.log_period = num_by_env("CVXBALL_LOG_PERIOD").unwrap_or(p.log_period);
}

//

#[test]
fn test_config_args()
{
    let cfg = ServerConfig::try_parse_from([
        "cvxball-server", "--port", "8080", "--solve-timeout-secs", "5", "--max-solves", "2",
    ]).unwrap();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.max_solves, 2);
    assert_eq!(cfg.solve_timeout(), Some(Duration::from_secs(5)));
    assert_eq!(cfg.bind_addr(), format!("{}:8080", cfg.host));
}

#[test]
fn test_num_by_env()
{
    std::env::set_var("CVXBALL_TEST_NUM_USIZE", "250");
    std::env::set_var("CVXBALL_TEST_NUM_F64", "0.5");
    std::env::set_var("CVXBALL_TEST_NUM_BAD", "many");

    assert_eq!(num_by_env::<usize>("CVXBALL_TEST_NUM_USIZE"), Some(250));
    assert_eq!(num_by_env::<f64>("CVXBALL_TEST_NUM_F64"), Some(0.5));
    assert_eq!(num_by_env::<usize>("CVXBALL_TEST_NUM_BAD"), None);
    assert_eq!(num_by_env::<usize>("CVXBALL_TEST_NUM_UNSET"), None);
}
