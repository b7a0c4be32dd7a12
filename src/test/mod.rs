//! 集成测试


mod ranking;
mod subnet;
mod tuple;
mod validate;
