//! Checked numeric wrappers, grounded in the original engine's `mymaths.c`:
//! thin layers over libm calls that fail fast on domain errors, overflow,
//! and underflow rather than letting a `NaN` or `inf` silently propagate
//! into a downstream comparison.

/// `e^x`, panicking if `x` is not finite or the result overflows or
/// underflows to exactly zero for a finite, non-`-inf` input.
pub fn exp_wrapper(x: f64) -> f64 {
    assert!(x.is_finite(), "exp_wrapper: input {x} is not finite");
    let result = x.exp();
    assert!(result.is_finite(), "exp_wrapper: exp({x}) overflowed");
    assert!(result != 0.0, "exp_wrapper: exp({x}) underflowed to zero");
    result
}

/// `ln(x)`, panicking if `x` is not finite, not positive, or the result is
/// not finite.
pub fn log_wrapper(x: f64) -> f64 {
    assert!(x.is_finite(), "log_wrapper: input {x} is not finite");
    assert!(x > 0.0, "log_wrapper: ln({x}) undefined for non-positive input");
    let result = x.ln();
    assert!(result.is_finite(), "log_wrapper: ln({x}) produced a non-finite result");
    result
}

/// `base^exp`, panicking on non-finite inputs, a negative base raised to a
/// fractional exponent, or a non-finite result.
pub fn pow_wrapper(base: f64, exp: f64) -> f64 {
    assert!(base.is_finite() && exp.is_finite(), "pow_wrapper: inputs must be finite (base={base}, exp={exp})");
    assert!(
        base >= 0.0 || exp.fract() == 0.0,
        "pow_wrapper: negative base {base} with fractional exponent {exp} is undefined"
    );
    let result = base.powf(exp);
    assert!(result.is_finite(), "pow_wrapper: {base}^{exp} overflowed");
    result
}
