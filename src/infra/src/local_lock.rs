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

//! Process-local keyed lock. Keys hash onto a fixed set of lanes, so two
//! holders of the same key always serialise while unrelated keys rarely
//! contend.

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use once_cell::sync::Lazy;
use tokio::sync::{Mutex, OwnedMutexGuard};

const LOCK_LANES: usize = 64;

static LANES: Lazy<Vec<Arc<Mutex<()>>>> = Lazy::new(|| {
    (0..LOCK_LANES)
        .map(|_| Arc::new(Mutex::new(())))
        .collect()
});

pub async fn lock(key: &str) -> OwnedMutexGuard<()> {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let lane = (hasher.finish() as usize) % LOCK_LANES;
    LANES[lane].clone().lock_owned().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::{
        sync::RwLock,
        time::{Duration, sleep},
    };

    use super::*;

    #[tokio::test]
    async fn test_same_key_serialises() {
        let shared = Arc::new(RwLock::new(0));
        let mut handles = Vec::new();

        for _ in 0..5 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let _guard = lock("PROD/host1").await;
                let current = *shared.read().await;
                sleep(Duration::from_millis(20)).await;
                if current == 0 {
                    *shared.write().await += 1;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // only the first holder saw the initial value
        assert_eq!(*shared.read().await, 1);
    }
}
