//! 实验结果.

use crate::sweep::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(kappa: f64, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    #[inline]
    fn u64_to_display(u: Option<u64>) -> String {
        match u {
            Some(u) => u.to_string(),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Profile `kappa = {kappa:.2}`:")?;
    writeln!(w, "{S4}Segmented cases: {}", p.get_runs())?;
    writeln!(w, "{S4}Average dice: {}", f64_to_display(p.get_avg_dice()))?;
    writeln!(w, "{S4}Worst dice: {}", f64_to_display(p.get_worst_dice()))?;
    writeln!(
        w,
        "{S4}Average iterations: {}",
        f64_to_display(p.get_avg_iterations())
    )?;
    writeln!(w, "{S4}Total time: {} us", p.get_total_time_us())?;
    let t = p.get_most_time_consuming().map(|d| d.as_micros() as u64);
    writeln!(w, "{S4}Most time-consuming case costs {} us", u64_to_display(t))?;
    write!(w, "{S4}Terminations:")?;
    for (t, n) in p.terminations() {
        write!(w, " {t:?} = {n};")?;
    }
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(f64, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (f64, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for (kappa, profile) in self.data.iter() {
            describe_into(*kappa, profile, &mut buf).unwrap();
            println!("{}", String::from_utf8_lossy(&buf));
            buf.clear();

            utils::sep();
        }
    }
}
