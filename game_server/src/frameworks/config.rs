use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn tcp_host() -> String {
    env::var("TCP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

pub fn tcp_port() -> u16 {
    env::var("TCP_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4000)
}

pub fn ttl_sweep_interval() -> Duration {
    let secs = env::var("TTL_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(30);
    Duration::from_secs(secs)
}
