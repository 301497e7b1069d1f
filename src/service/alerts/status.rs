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

//! Severity-driven status machine. Alerts open as long as something is
//! wrong, close on NORMAL, and only re-open on a genuine escalation from a
//! healthier state.

use config::meta::alerts::{Severity, Status};

/// Status for a freshly inserted alert.
pub fn initial(severity: Severity) -> Status {
    if severity == Severity::Normal {
        Status::Closed
    } else {
        Status::Open
    }
}

/// A duplicate never changes a healthy status, but it corrects a stale one:
/// anything outside OPEN/ACK/CLOSED is recomputed from the severity.
pub fn on_duplicate(severity: Severity, current: Status) -> Option<Status> {
    match current {
        Status::Open | Status::Ack | Status::Closed => None,
        _ => Some(initial(severity)),
    }
}

/// Transition on a severity change. `previous` is the severity the stored
/// alert had before the change was folded in.
pub fn on_severity_change(severity: Severity, previous: Severity) -> Option<Status> {
    use Severity::*;
    match severity {
        Debug | Inform => Some(Status::Open),
        Normal => Some(Status::Closed),
        Warning => escalation(previous, &[Normal]),
        Minor => escalation(previous, &[Normal, Warning]),
        Major => escalation(previous, &[Normal, Warning, Minor]),
        Critical => escalation(previous, &[Normal, Warning, Minor, Major]),
        Unknown => Some(Status::Unknown),
    }
}

fn escalation(previous: Severity, from: &[Severity]) -> Option<Status> {
    if from.contains(&previous) {
        Some(Status::Open)
    } else {
        None
    }
}
