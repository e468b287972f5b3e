use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::Rng;
use tracing::{info, warn};

use mercury_types::api::SendMessageRequest;

/// Fixed sender pool; one name is picked uniformly per request.
const NAMES: [&str; 10] = [
    "Michael", "Kevin", "Dwight", "Jim", "Ryan", "Pam", "Stanley", "Angela", "Oscar", "Kelly",
];

const WORKERS: usize = 50;
const REQUESTS_PER_WORKER: usize = 100;
const TEXT: &str = "text";

const DEFAULT_SERVERS: &str = "http://localhost:8000,http://localhost:8001";

/// Per-worker measurements. Each worker accumulates privately and the
/// results are merged after join, so no shared mutable state exists
/// between workers.
#[derive(Default)]
struct WorkerReport {
    latencies: Vec<Duration>,
    failures: usize,
}

impl WorkerReport {
    fn merge(&mut self, other: WorkerReport) {
        self.latencies.extend(other.latencies);
        self.failures += other.failures;
    }

    fn mean_latency(&self) -> Option<Duration> {
        if self.latencies.is_empty() {
            return None;
        }
        let total: Duration = self.latencies.iter().sum();
        Some(total / self.latencies.len() as u32)
    }
}

/// One logical worker: a fixed number of sequential sends, each against a
/// uniformly random backend. A failed request is logged and counted, and
/// the worker keeps going.
async fn run_worker(client: reqwest::Client, servers: Arc<Vec<String>>) -> WorkerReport {
    let mut report = WorkerReport::default();

    for _ in 0..REQUESTS_PER_WORKER {
        let body = SendMessageRequest {
            name: NAMES[rand::rng().random_range(0..NAMES.len())].to_string(),
            text: TEXT.to_string(),
        };
        let base = &servers[rand::rng().random_range(0..servers.len())];

        let started = Instant::now();
        match client.post(format!("{}/send", base)).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                report.latencies.push(started.elapsed());
            }
            Ok(resp) => {
                warn!("{} answered {}", base, resp.status());
                report.failures += 1;
            }
            Err(e) => {
                warn!("request to {} failed: {}", base, e);
                report.failures += 1;
            }
        }
    }

    report
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mercury_load=info".into()),
        )
        .init();

    let servers: Vec<String> = std::env::var("MERCURY_SERVERS")
        .unwrap_or_else(|_| DEFAULT_SERVERS.into())
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if servers.is_empty() {
        anyhow::bail!("MERCURY_SERVERS contained no usable base URLs");
    }
    let servers = Arc::new(servers);

    info!(
        "Firing {} workers x {} requests at {:?}",
        WORKERS, REQUESTS_PER_WORKER, servers
    );

    let client = reqwest::Client::new();
    let started = Instant::now();

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| tokio::spawn(run_worker(client.clone(), servers.clone())))
        .collect();

    let mut report = WorkerReport::default();
    for handle in handles {
        report.merge(handle.await?);
    }

    let wall = started.elapsed();
    let successes = report.latencies.len();
    let mean = report.mean_latency().unwrap_or_default();

    println!("Responses executed: {}", successes);
    println!("Failed requests:    {}", report.failures);
    println!("Average ping:       {:.6} s", mean.as_secs_f64());
    println!("Full time:          {:.3} s", wall.as_secs_f64());
    println!(
        "Capacity:           {:.1} RPS",
        successes as f64 / wall.as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_combines_latencies_and_failures() {
        let mut a = WorkerReport {
            latencies: vec![Duration::from_millis(10), Duration::from_millis(20)],
            failures: 1,
        };
        let b = WorkerReport {
            latencies: vec![Duration::from_millis(30)],
            failures: 2,
        };

        a.merge(b);
        assert_eq!(a.latencies.len(), 3);
        assert_eq!(a.failures, 3);
    }

    #[test]
    fn mean_latency_averages_merged_samples() {
        let report = WorkerReport {
            latencies: vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30),
            ],
            failures: 0,
        };

        assert_eq!(report.mean_latency(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn mean_latency_is_none_with_no_samples() {
        assert_eq!(WorkerReport::default().mean_latency(), None);
    }
}
