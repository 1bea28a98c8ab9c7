use std::{cmp::Ordering, fmt, sync::Arc};

/// Represents a single typed cell or literal.
///
/// Cells read from a CSV source and literals written in a `WHERE` clause go
/// through the same typing rule ([Value::infer]), so a stored `"42"` and a
/// literal `42` are both [Value::Int].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A present but blank cell.
    Empty,
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A UTF-8 string value, wrapped in an [Arc] for efficient,
    /// thread-safe sharing and cheap cloning.
    Text(Arc<str>),
}

impl Value {
    /// Types a raw token.
    ///
    /// The token is trimmed, then tried as an integer, then as a float.
    /// Anything else is kept as text, except a blank token which becomes
    /// [Value::Empty].
    ///
    /// # Example
    /// ```
    /// # use minisql::Value;
    /// assert_eq!(Value::infer(" 42 "), Value::Int(42));
    /// assert_eq!(Value::infer("-1.5"), Value::Float(-1.5));
    /// assert_eq!(Value::infer("Austin"), Value::Text("Austin".into()));
    /// assert_eq!(Value::infer("   "), Value::Empty);
    /// ```
    pub fn infer(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Self::Empty;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Self::Float(f);
        }
        Self::Text(Arc::from(s))
    }

    /// Ordering within the numeric class. Integers and floats are compared
    /// exactly, without rounding the integer to a float first.
    fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Some(l.cmp(r)),
            (Self::Float(l), Self::Float(r)) => l.partial_cmp(r),
            (Self::Int(i), Self::Float(f)) => cmp_int_float(*i, *f),
            (Self::Float(f), Self::Int(i)) => cmp_int_float(*i, *f).map(Ordering::reverse),
            _ => None,
        }
    }

    /// Equality as seen by a `WHERE` clause.
    ///
    /// Integers and floats compare numerically with each other. Text compares
    /// with text, and [Value::Empty] only equals another [Value::Empty].
    /// Every other pairing is unequal.
    pub fn sql_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Text(l), Self::Text(r)) => l == r,
            _ => self.numeric_cmp(other) == Some(Ordering::Equal),
        }
    }

    /// Ordering as seen by a `WHERE` clause.
    ///
    /// Defined only between two numbers or two texts (lexicographic).
    /// Returns `None` for every other pairing, including NaN.
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(l), Self::Text(r)) => Some(l.cmp(r)),
            _ => self.numeric_cmp(other),
        }
    }
}

/// Exact ordering of `i` against `f`; `None` when `f` is NaN.
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    // 2^63, the first float above i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return None;
    }
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }

    let whole = f.trunc() as i64;
    let fract = f.fract();
    Some(i.cmp(&whole).then(if fract > 0.0 {
        Ordering::Less
    } else if fract < 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write_float(f, *x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip form, switching to an exponent outside `1e-4..1e16`.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("nan");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "inf" } else { "-inf" });
    }

    let scientific = format!("{x:e}");
    if let Some((mantissa, exp)) = scientific.split_once('e')
        && let Ok(exp) = exp.parse::<i32>()
        && x != 0.0
        && !(-4..16).contains(&exp)
    {
        let sign = if exp < 0 { '-' } else { '+' };
        return write!(f, "{mantissa}e{sign}{:02}", exp.unsigned_abs());
    }

    // keep a fractional digit so 3.0 does not read as an integer
    if x.fract() == 0.0 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}
