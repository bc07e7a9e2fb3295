mod cases;
mod profile;

use log::{debug, warn};
use rss_berry::prelude::*;
use std::path::Path;
use utils::output;

pub use cases::{Case, CASES};
pub use profile::Profile;

/// 参与比较的曲率权重.
pub const KAPPAS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// 以曲率权重 `kappa` 分割全部病例. 若给出 `out`, 同时保存分割结果.
pub fn sweep(kappa: f64, cases: &[Case], out: Option<&Path>) -> Profile {
    let mut profile = Profile::new();
    for case in cases {
        let (volume, truth) = case.build();
        // 体积上限取真实体积的两倍, 防止泄漏时长时间运行.
        let max_ml = 2.0 * truth.count_foreground() as f64 * volume.voxel() / 1000.0;
        let params = SegmentParams::default()
            .with_curvature_weight(kappa)
            .with_max_volume_ml(max_ml)
            .with_num_iter(500);
        let seeds = PointSeeds::with_params(vec![case.seed()], &params);

        profile.start();
        let mut seg = Segmentor::with_robust_stats(&volume, params);
        if let Err(e) = seg.prepare(&seeds) {
            warn!("{}: {e}", case.name);
            continue;
        }
        let report = seg.run();
        let dice = seg.mask_output().dice(&truth);
        profile.record(&report, dice);
        debug!("kappa = {kappa:.2}, {}: dice = {dice:.4}, {report}", case.name);

        if let Some(dir) = out {
            let name = format!("{}-kappa{:03}", case.name, (kappa * 100.0).round() as u32);
            if let Err(e) = output::save_label(dir, &name, &seg.label_output()) {
                warn!("{name}: {e}");
            }
        }
    }
    profile
}
