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

use std::time::Instant;

use config::{meta::alerts::Alert, metrics};

use super::stats;

pub mod correlate;
pub mod parsers;
pub mod publish;
pub mod status;
pub mod transform;

/// Process one dequeued alert end-to-end: transform rules, correlation,
/// persistence, fan-out, stats. A store failure aborts the remaining steps
/// for this alert only.
pub async fn process(mut alert: Alert, queue_len: i64) -> Result<(), anyhow::Error> {
    let work_start = Instant::now();
    log::info!("{} : {}", alert.id, alert.summary);

    if transform::apply(&mut alert) {
        log::info!("{} : Suppressing alert {}", alert.id, alert.summary);
        metrics::ALERTS_SUPPRESSED.inc();
        return Ok(());
    }

    let processed = correlate::process(alert).await?;
    if processed.correlation.should_publish() {
        publish::forward(&processed.alert).await;
    }

    stats::record(&processed.alert, work_start, queue_len).await;
    Ok(())
}
