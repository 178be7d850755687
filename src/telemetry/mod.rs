pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

pub fn channels() -> LogCtx<ops::channels::Channels> { LogCtx::new(config::logs_are_json()) }
pub fn runs() -> LogCtx<ops::runs::Runs> { LogCtx::new(config::logs_are_json()) }
pub fn serve() -> LogCtx<ops::serve::Serve> { LogCtx::new(config::logs_are_json()) }
