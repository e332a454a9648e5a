pub mod fan_out;
pub mod request_ctx;

pub use fan_out::fan_out;
pub use request_ctx::RequestCtx;
