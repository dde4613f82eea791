//! times - report accumulated process times
//!
//! Two lines: shell user/system time, then children user/system time,
//! each field as `MmS.FFFFs` with trailing zeros suppressed and seconds
//! that round to 60 carried into the minutes.

use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

/// Format clock ticks as minutes plus fractional seconds.
fn conv_time(ticks: u64, ticks_per_minute: u64) -> (u64, String) {
    let mut mins = ticks / ticks_per_minute;
    let frac = (ticks - mins * ticks_per_minute) as f64 * 60.0 / ticks_per_minute as f64;
    let mut seconds = format!("{:.4}", frac);

    if seconds.starts_with("60") {
        // 59.99995 got rounded up.
        mins += 1;
        seconds = "0.0".to_string();
    }

    while seconds.ends_with('0') && !seconds.ends_with(".0") {
        seconds.pop();
    }
    (mins, seconds)
}

#[cfg(unix)]
fn process_times() -> (u64, u64, u64, u64, u64) {
    let mut tms = libc::tms { tms_utime: 0, tms_stime: 0, tms_cutime: 0, tms_cstime: 0 };
    // SAFETY: tms is a plain struct the kernel fills in.
    unsafe {
        libc::times(&mut tms);
        let tick = libc::sysconf(libc::_SC_CLK_TCK);
        let tpm = if tick > 0 { tick as u64 * 60 } else { 6000 };
        (tms.tms_utime as u64, tms.tms_stime as u64, tms.tms_cutime as u64, tms.tms_cstime as u64, tpm)
    }
}

#[cfg(not(unix))]
fn process_times() -> (u64, u64, u64, u64, u64) {
    (0, 0, 0, 0, 6000)
}

pub fn times_cmd(ev: &Evaluator, state: &mut ShellState, _argv: &[String]) -> EvalResult<i32> {
    let (utime, stime, cutime, cstime, tpm) = process_times();
    let (um, us) = conv_time(utime, tpm);
    let (sm, ss) = conv_time(stime, tpm);
    let (cum, cus) = conv_time(cutime, tpm);
    let (csm, css) = conv_time(cstime, tpm);
    let out = format!("{}m{}s {}m{}s\n{}m{}s {}m{}s\n", um, us, sm, ss, cum, cus, csm, css);
    ev.out1(state, &out)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::harness;

    #[test]
    fn test_conv_time_trailing_zero_suppression() {
        // 100 ticks/sec => 6000 ticks per minute.
        assert_eq!(conv_time(0, 6000), (0, "0.0".to_string()));
        assert_eq!(conv_time(150, 6000), (0, "1.5".to_string()));
        assert_eq!(conv_time(125, 6000), (0, "1.25".to_string()));
        assert_eq!(conv_time(6000, 6000), (1, "0.0".to_string()));
        assert_eq!(conv_time(6150, 6000), (1, "1.5".to_string()));
    }

    #[test]
    fn test_times_output_shape() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let argv = vec!["times".to_string()];
        assert_eq!(times_cmd(&ev, &mut st, &argv).unwrap(), 0);
        let lines: Vec<&str> = st.io.stdout.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let fields: Vec<&str> = line.split(' ').collect();
            assert_eq!(fields.len(), 2);
            for field in fields {
                assert!(field.contains('m') && field.ends_with('s'), "bad field {}", field);
            }
        }
    }
}
