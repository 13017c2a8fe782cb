/*! Integration tests for otsync-core.
 *
 * Organized as a single integration test binary:
 * - convergence: property tests of the transformation functions
 * - scenarios: end to end runs of the sync controller
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("otsync_core=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod convergence;
mod helpers;
mod scenarios;
