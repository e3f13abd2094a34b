// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label text generation.
//!
//! Labels are read from node records with an [`Accessor`] and optionally formatted. Number
//! formats use a subset of the d3-format specifier grammar:
//!
//! ```text
//! [[fill]align][sign][$][0][width][,][.precision][~][type]
//! ```
//!
//! with `type` one of `e`, `f`, `d`, `%`, `s`, or empty (general notation, trimmed).

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;

use serde_json::Value;

use crate::accessor::{Accessor, value_to_string};
use crate::error::FormatError;
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Widest padding a specifier may ask for.
const MAX_WIDTH: usize = 1024;

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "\u{b5}", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Alignment of a formatted number within its width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    /// Pad on the right.
    Left,
    /// Pad on the left.
    #[default]
    Right,
    /// Pad both sides.
    Center,
    /// Pad between the sign and the digits.
    AfterSign,
}

/// Sign display policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sign {
    /// Only negative numbers get a sign.
    #[default]
    Negative,
    /// Positive numbers get `+`.
    Always,
    /// Positive numbers get a space.
    Space,
    /// Negative numbers are wrapped in parentheses.
    Parentheses,
}

/// Number notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatType {
    /// `e`: exponent notation.
    Exponent,
    /// `f`: fixed point.
    Fixed,
    /// `d`: integer, rounded.
    Integer,
    /// `%`: multiplied by 100, fixed point, with a `%` suffix.
    Percent,
    /// `s`: significant digits with an SI prefix.
    SiPrefix,
}

/// A parsed number format specifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberFormat {
    /// Padding character.
    pub fill: char,
    /// Padding alignment.
    pub align: Align,
    /// Sign policy.
    pub sign: Sign,
    /// Prefix with `$`.
    pub currency: bool,
    /// Minimum width.
    pub width: Option<usize>,
    /// Group thousands with `,`.
    pub comma: bool,
    /// Digits after the point (fixed types) or significant digits (`s` and general).
    pub precision: Option<usize>,
    /// Trim insignificant trailing zeros.
    pub trim: bool,
    /// Notation; `None` is general notation with trimming.
    pub kind: Option<FormatType>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: Align::Right,
            sign: Sign::Negative,
            currency: false,
            width: None,
            comma: false,
            precision: None,
            trim: false,
            kind: None,
        }
    }
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

impl NumberFormat {
    /// Parses a specifier such as `".2f"`, `",d"`, `"+.1%"` or `".3~s"`.
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let invalid = || FormatError::InvalidSpecifier(spec.to_string());
        let chars: alloc::vec::Vec<char> = spec.chars().collect();
        let mut f = Self::default();
        let mut i = 0;

        if chars.len() >= 2
            && let Some(align) = align_of(chars[1])
        {
            f.fill = chars[0];
            f.align = align;
            i = 2;
        } else if let Some(align) = chars.first().copied().and_then(align_of) {
            f.align = align;
            i = 1;
        }

        if let Some(&c) = chars.get(i) {
            let sign = match c {
                '-' => Some(Sign::Negative),
                '+' => Some(Sign::Always),
                ' ' => Some(Sign::Space),
                '(' => Some(Sign::Parentheses),
                _ => None,
            };
            if let Some(sign) = sign {
                f.sign = sign;
                i += 1;
            }
        }
        if chars.get(i) == Some(&'$') {
            f.currency = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            f.fill = '0';
            f.align = Align::AfterSign;
            i += 1;
        }
        let start = i;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
        if i > start {
            let digits: String = chars[start..i].iter().collect();
            let width = digits.parse().map_err(|_| invalid())?;
            if width > MAX_WIDTH {
                return Err(invalid());
            }
            f.width = Some(width);
        }
        if chars.get(i) == Some(&',') {
            f.comma = true;
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(char::is_ascii_digit) {
                i += 1;
            }
            if i == start {
                return Err(invalid());
            }
            let digits: String = chars[start..i].iter().collect();
            // Only overflow can fail here; it clamps like any other large precision.
            f.precision = Some(digits.parse().unwrap_or(usize::MAX));
        }
        if chars.get(i) == Some(&'~') {
            f.trim = true;
            i += 1;
        }
        if let Some(&c) = chars.get(i) {
            f.kind = Some(match c {
                'e' => FormatType::Exponent,
                'f' => FormatType::Fixed,
                'd' => FormatType::Integer,
                '%' => FormatType::Percent,
                's' => FormatType::SiPrefix,
                other if other.is_ascii_alphabetic() => {
                    return Err(FormatError::UnsupportedType(other));
                }
                _ => return Err(invalid()),
            });
            i += 1;
        }
        if i != chars.len() {
            return Err(invalid());
        }
        f.precision = f.precision.map(|p| match f.kind {
            None | Some(FormatType::SiPrefix) => p.clamp(1, 21),
            Some(_) => p.min(20),
        });
        Ok(f)
    }

    /// Formats a number.
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return if value.is_nan() {
                String::from("NaN")
            } else if value > 0.0 {
                String::from("Infinity")
            } else {
                String::from("-Infinity")
            };
        }
        let abs = value.abs();
        let mut suffix = "";
        let mut trim = self.trim;
        let mut body = match self.kind {
            None => {
                trim = true;
                to_precision(abs, self.precision.unwrap_or(12).max(1))
            }
            Some(FormatType::Fixed) => format!("{:.*}", self.precision.unwrap_or(6), abs),
            Some(FormatType::Integer) => abs.round().to_string(),
            Some(FormatType::Percent) => {
                suffix = "%";
                format!("{:.*}", self.precision.unwrap_or(6), abs * 100.0)
            }
            Some(FormatType::Exponent) => to_exponential(abs, self.precision.unwrap_or(6)),
            Some(FormatType::SiPrefix) => {
                let (digits, prefix) = si_prefix(abs, self.precision.unwrap_or(6).max(1));
                suffix = prefix;
                digits
            }
        };
        if trim {
            body = trim_zeros(&body);
        }
        if self.comma {
            body = group_thousands(&body);
        }

        let negative = value < 0.0 && body.bytes().any(|b| (b'1'..=b'9').contains(&b));
        let (sign_prefix, sign_suffix) = match (negative, self.sign) {
            (true, Sign::Parentheses) => ("(", ")"),
            (true, _) => ("-", ""),
            (false, Sign::Always) => ("+", ""),
            (false, Sign::Space) => (" ", ""),
            (false, _) => ("", ""),
        };
        let prefix = format!("{sign_prefix}{}", if self.currency { "$" } else { "" });
        let suffix = format!("{suffix}{sign_suffix}");

        let len = prefix.chars().count() + body.chars().count() + suffix.chars().count();
        let pad_len = self.width.unwrap_or(0).saturating_sub(len);
        let pad: String = core::iter::repeat_n(self.fill, pad_len).collect();
        match self.align {
            Align::Left => format!("{prefix}{body}{suffix}{pad}"),
            Align::Right => format!("{pad}{prefix}{body}{suffix}"),
            Align::AfterSign => format!("{prefix}{pad}{body}{suffix}"),
            Align::Center => {
                let left: String = pad.chars().take(pad_len / 2).collect();
                let right: String = pad.chars().skip(pad_len / 2).collect();
                format!("{left}{prefix}{body}{suffix}{right}")
            }
        }
    }
}

/// Decimal exponent of `abs` after rounding to `p` significant digits.
fn rounded_exponent(abs: f64, p: usize) -> i32 {
    let s = format!("{:.*e}", p.saturating_sub(1), abs);
    s.split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0)
}

fn exponent_suffix(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{mantissa}e{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}e+{exp}"),
        None => s.to_string(),
    }
}

fn to_exponential(abs: f64, decimals: usize) -> String {
    exponent_suffix(&format!("{abs:.decimals$e}"))
}

#[allow(clippy::cast_possible_truncation, reason = "precision is clamped to 1..=21")]
fn to_precision(abs: f64, p: usize) -> String {
    if abs == 0.0 {
        return format!("{:.*}", p - 1, 0.0);
    }
    let e = rounded_exponent(abs, p);
    if e < -6 || e >= p as i32 {
        to_exponential(abs, p - 1)
    } else {
        let decimals = (p as i32 - 1 - e).max(0) as usize;
        format!("{abs:.decimals$}")
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "the prefix exponent is clamped to -8..=8 and precision to 1..=21"
)]
fn si_prefix(abs: f64, p: usize) -> (String, &'static str) {
    if abs == 0.0 {
        return (format!("{:.*}", p - 1, 0.0), "");
    }
    let e = rounded_exponent(abs, p);
    let k = (f64::from(e) / 3.0).floor().clamp(-8.0, 8.0) as i32;
    let scaled = abs / 10_f64.powi(3 * k);
    let decimals = (p as i32 - 1 - (e - 3 * k)).max(0) as usize;
    let index = (k + 8) as usize;
    (format!("{scaled:.decimals$}"), SI_PREFIXES[index])
}

fn trim_zeros(s: &str) -> String {
    let (mantissa, exp) = match s.find('e') {
        Some(i) => s.split_at(i),
        None => (s, ""),
    };
    if !mantissa.contains('.') {
        return s.to_string();
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{exp}")
}

fn group_thousands(s: &str) -> String {
    let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (int, rest) = s.split_at(digits_end);
    let mut out = String::with_capacity(s.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push_str(rest);
    out
}

/// How label values are turned into text.
#[derive(Clone, Default)]
pub enum LabelFormat {
    /// Values are rendered as-is.
    #[default]
    None,
    /// Numeric values are formatted with a number format.
    Number(NumberFormat),
    /// A custom formatter over the accessed value.
    Custom(Arc<dyn Fn(&Value) -> String>),
}

impl core::fmt::Debug for LabelFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for LabelFormat {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => {
                core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl LabelFormat {
    /// Parses a number format specifier.
    pub fn number(spec: &str) -> Result<Self, FormatError> {
        NumberFormat::parse(spec).map(Self::Number)
    }

    /// Creates a custom formatter.
    pub fn custom(f: impl Fn(&Value) -> String + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }
}

/// Produces label text for node records.
#[derive(Debug, PartialEq)]
pub struct LabelGenerator {
    label: Accessor,
    format: LabelFormat,
}

impl LabelGenerator {
    /// Creates a generator reading `label` and applying `format`.
    pub fn new(label: Accessor, format: LabelFormat) -> Self {
        Self { label, format }
    }

    /// Returns the label for a record, or `None` if the accessor yields nothing.
    ///
    /// Number formats only apply to numeric values; other values are rendered as-is.
    pub fn label(&self, datum: &Value) -> Option<String> {
        let value = self.label.get(datum)?;
        Some(match &self.format {
            LabelFormat::None => value_to_string(&value),
            LabelFormat::Number(format) => match value.as_f64() {
                Some(n) => format.format(n),
                None => value_to_string(&value),
            },
            LabelFormat::Custom(f) => f(&value),
        })
    }
}
