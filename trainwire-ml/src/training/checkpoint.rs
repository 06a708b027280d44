//! Checkpoint naming and the model-state seam.
//!
//! Serializing model state belongs to whatever framework owns the model.
//! Observers only see it through [`Checkpointable`].

use std::path::Path;

use crate::error::MlError;

/// Save and restore model state to and from a file.
pub trait Checkpointable {
    fn save_checkpoint(&self, path: &Path) -> Result<(), MlError>;
    fn load_checkpoint(&mut self, path: &Path) -> Result<(), MlError>;
}

/// File name for an improved checkpoint, e.g. `best_epoch_4_mse_3.0.ckpt`.
pub fn best_checkpoint_name(epoch: usize, label: &str, value: f64, precision: usize) -> String {
    format!(
        "best_epoch_{epoch}_{label}_{}.ckpt",
        format_metric(value, precision)
    )
}

/// Format `value` with `precision` significant digits.
///
/// Fixed notation keeps at least one fractional digit (`3.0`, `4.5`,
/// `0.00012`). Exponent notation (`1e+01`, `1.2e-05`) is used when the
/// decimal exponent is below -4 or at least `precision - 1`.
pub fn format_metric(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let precision = precision.max(1);
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let sci = format!("{:.*e}", precision - 1, value.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{value}");
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    let mut digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }

    // Position of the decimal point relative to the first digit.
    let point = exp + 1;
    let body = if point <= -4 || point > precision as i32 - 1 {
        let (first, rest) = digits.split_at(1);
        let dot = if rest.is_empty() { "" } else { "." };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{first}{dot}{rest}e{exp_sign}{:02}", exp.abs())
    } else if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else {
        let point = point as usize;
        if point >= digits.len() {
            format!("{digits}{}.0", "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };

    format!("{sign}{body}")
}
