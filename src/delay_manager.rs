use std::thread;
use std::time::Duration;

use log::debug;
use rand::Rng;

/// Stand-in for the network round trip of a real search. A zero upper bound
/// disables the delay.
pub fn simulated_search_delay(min_ms: u64, max_ms: u64) {
    if max_ms == 0 {
        return;
    }
    let mut rng = rand::thread_rng();
    let delay_ms = rng.gen_range(min_ms.min(max_ms)..=max_ms);
    debug!("Waiting for {} ms (Search Delay)...", delay_ms);
    thread::sleep(Duration::from_millis(delay_ms));
}
