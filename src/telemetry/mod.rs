pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

pub fn init() -> LogCtx<ops::init::Init> { LogCtx::new() }
pub fn update() -> LogCtx<ops::update::Update> { LogCtx::new() }
pub fn status() -> LogCtx<ops::status::Status> { LogCtx::new() }
