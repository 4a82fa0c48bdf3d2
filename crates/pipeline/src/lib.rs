//! The tunedrop relocation pipeline.
//!
//! A [scanner](scan) discovers [`Candidate`]s in the source directory and
//! queues them; a single [worker](relocate) takes them off the queue one at a
//! time and moves them into the destination. [`run`] wires the two together.

mod candidate;
pub mod error;
mod pattern;
pub mod relocate;
mod run;
pub mod scan;

pub use crate::candidate::Candidate;
pub use crate::pattern::Pattern;
pub use crate::relocate::Summary;
pub use crate::run::run;

use crate::error::{ErrorKind, Result};
use crate::relocate::DestinationGuard;
use exn::ResultExt;
use tunedrop_config::Config;
use tunedrop_notifier::NotifierHandle;

/// Everything the pipeline needs, built once at startup and read-only after.
pub struct Context {
    pub config: Config,
    pub pattern: Pattern,
    pub guard: DestinationGuard,
    pub notifier: NotifierHandle,
}

impl Context {
    pub fn new(config: Config, notifier: NotifierHandle) -> Result<Self> {
        let pattern = Pattern::new(&config.pattern).or_raise(|| ErrorKind::Config)?;
        let guard = DestinationGuard::new(&config.destination, &config.guard);
        Ok(Self { config, pattern, guard, notifier })
    }
}
