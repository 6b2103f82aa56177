use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Timeout of a single connection attempt
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(200);

/// Outcome of probing the command server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub address: String,
    pub listening: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Wait until something accepts TCP connections at `address`.
///
/// Attempts are made every `interval` until one succeeds or `deadline`
/// has passed. At least one attempt is always made.
pub async fn wait_for_listener(address: &str, deadline: Duration, interval: Duration) -> ProbeReport {
    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let last_error = match tokio::time::timeout(ATTEMPT_TIMEOUT, TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => {
                info!("Command server is listening at {}", address);
                return ProbeReport {
                    address: address.to_string(),
                    listening: true,
                    attempts,
                    last_error: None,
                };
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "connection attempt timed out".to_string(),
        };
        debug!("Probe attempt {} to {} failed: {}", attempts, address, last_error);

        if started.elapsed() + interval > deadline {
            warn!("Command server not listening at {}: {}", address, last_error);
            return ProbeReport {
                address: address.to_string(),
                listening: false,
                attempts,
                last_error: Some(last_error),
            };
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_listening_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let report = wait_for_listener(&address, Duration::from_secs(2), Duration::from_millis(20)).await;
        assert!(report.listening);
        assert_eq!(report.attempts, 1);
        assert!(report.last_error.is_none());
    }

    #[tokio::test]
    async fn test_closed_port() {
        // Bind then drop to get a port nothing listens on
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let report = wait_for_listener(&address, Duration::from_millis(100), Duration::from_millis(20)).await;
        assert!(!report.listening);
        assert!(report.attempts >= 1);
        assert!(report.last_error.is_some());
    }

    #[tokio::test]
    async fn test_zero_deadline_makes_one_attempt() {
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let report = wait_for_listener(&address, Duration::ZERO, Duration::from_millis(20)).await;
        assert_eq!(report.attempts, 1);
        assert!(!report.listening);
    }

    #[tokio::test]
    async fn test_server_appears_later() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let rebind = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let listener = TcpListener::bind(address).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(listener);
        });

        let report = wait_for_listener(&address.to_string(), Duration::from_secs(2), Duration::from_millis(20)).await;
        assert!(report.listening);
        assert!(report.attempts > 1);
        rebind.abort();
    }
}
