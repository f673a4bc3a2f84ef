// Dimension literal parsing and viewport-relative unit resolution.
//
// Grounded on original_source/aplcore/include/apl/primitives/dimension.h
// and dimension.cpp: px/dp are absolute (display-pixel) measurements, `%`
// is relative to the parent, `vh`/`vw` are resolved against viewport
// metrics at compile time, and `auto` is the sentinel dimension.

use lazy_static::lazy_static;
use regex::Regex;

use crate::object::Object;

/// Screen metrics used to resolve `vh`/`vw` units to absolute pixels,
/// mirroring the teacher's `config::Screen` (src/config.rs).
#[derive(Copy, Clone, Debug)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Viewport {
        Viewport { width: 0.0, height: 0.0 }
    }
}

/// Parse a dimension literal's numeric part and unit suffix, e.g. "10dp",
/// "50%", "auto", "20vh". Returns None if `text` isn't a dimension literal
/// at all (the caller then tries other primary productions).
///
/// Grounded on src/vm.rs's `decode_word`, which compiles its token
/// patterns once via `lazy_static!` and matches against them rather than
/// hand-rolling prefix/suffix checks.
pub fn parse_dimension(text: &str, viewport: &Viewport) -> Option<Object> {
    lazy_static! {
        static ref DIMENSION_RE: Regex = Regex::new(r"^(-?[0-9]+(?:\.[0-9]+)?)(px|dp|vh|vw|%)$").unwrap();
    }

    let trimmed = text.trim();
    if trimmed == "auto" {
        return Some(Object::AutoDimension);
    }

    let captures = DIMENSION_RE.captures(trimmed)?;
    let value: f64 = captures[1].parse().ok()?;

    Some(match &captures[2] {
        "px" | "dp" => Object::AbsoluteDimension(value),
        "%" => Object::RelativeDimension(value),
        "vh" => Object::AbsoluteDimension(value / 100.0 * viewport.height),
        "vw" => Object::AbsoluteDimension(value / 100.0 * viewport.width),
        _ => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute() {
        assert_eq!(parse_dimension("10dp", &Viewport::default()), Some(Object::AbsoluteDimension(10.0)));
        assert_eq!(parse_dimension("10px", &Viewport::default()), Some(Object::AbsoluteDimension(10.0)));
    }

    #[test]
    fn parses_relative_and_auto() {
        assert_eq!(parse_dimension("50%", &Viewport::default()), Some(Object::RelativeDimension(50.0)));
        assert_eq!(parse_dimension("auto", &Viewport::default()), Some(Object::AutoDimension));
    }

    #[test]
    fn resolves_viewport_units() {
        let vp = Viewport { width: 1000.0, height: 2000.0 };
        assert_eq!(parse_dimension("10vh", &vp), Some(Object::AbsoluteDimension(200.0)));
        assert_eq!(parse_dimension("10vw", &vp), Some(Object::AbsoluteDimension(100.0)));
    }

    #[test]
    fn rejects_non_dimension() {
        assert_eq!(parse_dimension("abc", &Viewport::default()), None);
    }
}
