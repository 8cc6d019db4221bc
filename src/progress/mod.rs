//! Hierarchical progress tree with log/tty/db subscribers (spec §4.7).

pub mod step;
pub mod subscribers;

pub use step::{DbProgressSubscriber, ProgressSubscriber, StepHandle, StepTree};
pub use subscribers::{LogProgressSubscriber, TtyProgressSubscriber};
