//! 程序运行函数.

use crate::result::AblationResult;
use crate::sweep::{self, CASES, KAPPAS};
use log::info;
use std::thread;
use utils::output;

/// 实际运行. 每个曲率权重占用一个线程.
pub fn run() -> AblationResult {
    let out = output::output_dir_from_env_or_home();
    if let Some(ref dir) = out {
        info!("Saving labels into {}", dir.display());
    }
    info!(
        "Running ablation studies on {} cases with {} cpus...",
        CASES.len(),
        utils::cpus()
    );

    thread::scope(|s| {
        let out = out.as_deref();
        let handles = KAPPAS.map(|k| s.spawn(move || sweep::sweep(k, &CASES, out)));

        AblationResult::from_iter(
            KAPPAS.into_iter().zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    })
}
