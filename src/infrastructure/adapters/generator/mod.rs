//! Generator Adapter - 文本生成客户端实现

mod fake_generator;
mod http_generator;

pub use fake_generator::{FakeGenerator, FakeGeneratorConfig};
pub use http_generator::*;
