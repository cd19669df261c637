//! Logarithms of factorials.
//!
//! Korfball scores routinely pass 20 and occasionally 35, which puts `n!` beyond `u128`, so
//! factorials are only ever handled in log space.

pub trait LnFactorial {
    /// Natural logarithm of `n!`.
    fn ln(&self, n: u16) -> f64;
}

#[derive(Default)]
pub struct Calculator;

impl LnFactorial for Calculator {
    #[inline]
    fn ln(&self, n: u16) -> f64 {
        let mut sum = 0.0;
        for i in 2..=n {
            sum += f64::ln(i as f64);
        }
        sum
    }
}

const MAX_ENTRIES: usize = 128;

/// Precomputed table of `ln(n!)` for `n < 128`; larger arguments fall through to the
/// [Calculator].
pub struct Lookup {
    entries: [f64; MAX_ENTRIES],
}
impl LnFactorial for Lookup {
    #[inline]
    fn ln(&self, n: u16) -> f64 {
        match self.entries.get(n as usize) {
            Some(&entry) => entry,
            None => Calculator.ln(n),
        }
    }
}

impl Default for Lookup {
    fn default() -> Self {
        let mut entries = [0.0; MAX_ENTRIES];
        for i in 2..MAX_ENTRIES {
            entries[i] = f64::ln(i as f64) + entries[i - 1];
        }
        Self { entries }
    }
}
