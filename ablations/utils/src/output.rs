//! 实验输出位置.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rss_berry::LabelVolume;

/// 获取实验输出目录.
///
/// 1. 若环境变量 `$RSS_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 若 `$HOME/dataset/rss` 存在, 返回之;
/// 3. 否则返回 `None`, 表示不保存结果.
pub fn output_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("RSS_OUTPUT_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dirs::home_dir()
            .map(|h| h.join("dataset").join("rss"))
            .filter(|p| p.is_dir()),
    }
}

/// 将 `label` 以 `{name}.nii.gz` 保存到 `dir` 下. 目录不存在时创建之.
pub fn save_label(dir: &Path, name: &str, label: &LabelVolume) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{name}.nii.gz"));
    label
        .save(&path)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(path)
}
