// Copyright 2025 OpenObserve Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts};

pub const NAMESPACE: &str = "alerta";

pub static ALERTS_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("alerts_received", "Alert messages decoded from the inbound queue")
            .namespace(NAMESPACE),
    )
    .expect("Metric created")
});

pub static ALERTS_PROCESSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("alerts_processed", "Alerts fully processed by a worker").namespace(NAMESPACE),
    )
    .expect("Metric created")
});

pub static ALERTS_SUPPRESSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("alerts_suppressed", "Alerts discarded by a blackout rule").namespace(NAMESPACE),
    )
    .expect("Metric created")
});

pub static ALERTS_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("alerts_dropped", "Inbound bodies dropped as undecodable").namespace(NAMESPACE),
    )
    .expect("Metric created")
});

pub static HEARTBEATS_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("heartbeats_received", "Heartbeat messages received").namespace(NAMESPACE),
    )
    .expect("Metric created")
});

pub static QUEUE_LENGTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("queue_length", "Length of the internal alert queue").namespace(NAMESPACE),
    )
    .expect("Metric created")
});

pub static ALERT_PROCESS_TIME: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("alert_process_time", "Seconds spent processing one alert")
            .namespace(NAMESPACE),
    )
    .expect("Metric created")
});

pub fn init() {
    let registry = prometheus::default_registry();
    let _ = registry.register(Box::new(ALERTS_RECEIVED.clone()));
    let _ = registry.register(Box::new(ALERTS_PROCESSED.clone()));
    let _ = registry.register(Box::new(ALERTS_SUPPRESSED.clone()));
    let _ = registry.register(Box::new(ALERTS_DROPPED.clone()));
    let _ = registry.register(Box::new(HEARTBEATS_RECEIVED.clone()));
    let _ = registry.register(Box::new(QUEUE_LENGTH.clone()));
    let _ = registry.register(Box::new(ALERT_PROCESS_TIME.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        init();
        init(); // re-registration is ignored, not fatal
        ALERTS_PROCESSED.inc();
        assert!(ALERTS_PROCESSED.get() >= 1);
    }
}
