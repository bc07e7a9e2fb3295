//! 曲率权重消融实验.
//!
//! 在一组合成带噪球体上, 以不同的曲率权重运行稳健统计分割,
//! 并报告与真实掩膜的 Dice 系数, 迭代次数, 运行时间和终止原因.

mod result;
mod runner;
mod sweep;

use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .expect("Logger initialization error");

    let result = runner::run();
    result.analyze();
}
